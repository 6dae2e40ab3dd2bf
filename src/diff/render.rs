use super::{Operation, Segment};

/// Wrap each segment in `<span>`, `<ins>` or `<del>`, in script order.
///
/// Text is inserted verbatim. Revision content is already markup, so the
/// tags it carries must survive the round trip.
pub fn render_diff(segments: &[Segment]) -> String {
    let mut html = String::new();
    for segment in segments {
        let tag = match segment.op {
            Operation::Equal => "span",
            Operation::Insert => "ins",
            Operation::Delete => "del",
        };
        html.push_str(&format!("<{tag}>{}</{tag}>", segment.text));
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;

    #[test]
    fn test_render_order_follows_script() {
        let segments = vec![
            Segment::new(Operation::Equal, "a"),
            Segment::new(Operation::Delete, "b"),
            Segment::new(Operation::Insert, "c"),
            Segment::new(Operation::Equal, "d"),
        ];
        assert_eq!(
            render_diff(&segments),
            "<span>a</span><del>b</del><ins>c</ins><span>d</span>"
        );
    }

    #[test]
    fn test_render_identical_text() {
        let s = "<h3>Title</h3>body";
        assert_eq!(render_diff(&diff(s, s)), format!("<span>{}</span>", s));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_diff(&[]), "");
    }
}
