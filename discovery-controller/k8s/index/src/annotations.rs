use discovery_controller_k8s_api::labels::Map;
use regex::Regex;

/// Renders the annotations recorded on a service.
///
/// Annotations whose keys match the pattern (all annotations, when there is no pattern) are
/// rendered as `key:value` terms in key order. Terms that would push the rendering past
/// `max_len` bytes are dropped, along with every term after them.
#[derive(Clone, Debug)]
pub struct AnnotationFilter {
    pattern: Option<Regex>,
    max_len: usize,
}

// === impl AnnotationFilter ===

impl AnnotationFilter {
    pub const DEFAULT_MAX_LEN: usize = 256;

    pub fn new(pattern: Option<Regex>, max_len: usize) -> Self {
        Self { pattern, max_len }
    }

    pub fn render(&self, annotations: &Map) -> String {
        let mut rendered = String::new();
        let matching = annotations
            .iter()
            .filter(|(k, _)| self.pattern.as_ref().map_or(true, |p| p.is_match(k)));
        for (k, v) in matching {
            let sep = if rendered.is_empty() { "" } else { ", " };
            if rendered.len() + sep.len() + k.len() + 1 + v.len() > self.max_len {
                break;
            }
            rendered.push_str(sep);
            rendered.push_str(k);
            rendered.push(':');
            rendered.push_str(v);
        }
        rendered
    }
}

impl Default for AnnotationFilter {
    fn default() -> Self {
        Self::new(None, Self::DEFAULT_MAX_LEN)
    }
}
