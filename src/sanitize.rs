//! Response sanitizer: the model sometimes wraps JSON in a markdown fence even when
//! asked for raw structured output.

const FENCE: &str = "```";

/// Strip an optional ```` ```json ```` / ```` ``` ```` fence and surrounding whitespace.
pub fn sanitize(raw: &str) -> String {
  let mut s = raw.trim();
  if let Some(rest) = s.strip_prefix(FENCE) {
    s = match rest.get(..4) {
      Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
      _ => rest,
    };
    if let Some(body) = s.trim_end().strip_suffix(FENCE) {
      s = body;
    }
  }
  s.trim().to_string()
}
