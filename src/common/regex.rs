//! Regex helpers that report runtime errors instead of panicking.

use fancy_regex::{Regex, Replacer};

/// Replace every match of `re` in `text`.
///
/// Unlike `Regex::replace_all`, a runtime failure such as an exceeded
/// backtrack limit is returned as an error.
pub fn try_replace_all<R: Replacer>(
    re: &Regex,
    text: &str,
    mut rep: R,
) -> fancy_regex::Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let caps = caps?;
        let Some(m) = caps.get(0) else {
            continue;
        };
        out.push_str(&text[last..m.start()]);
        rep.replace_append(&caps, &mut out);
        last = m.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}
