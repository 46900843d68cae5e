//! Channel name to callable name transform.
//!
//! Channel names are split on every character that is not a letter or
//! digit, and the pieces are rejoined in camelCase:
//! `"user.get-data"` becomes `"userGetData"`.

/// Map a declared channel name to its call-site name.
///
/// Returns an empty string when the channel has no letters or digits.
pub fn to_callable_name(channel: &str) -> String {
    let mut out = String::with_capacity(channel.len());
    for (i, token) in channel
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .enumerate()
    {
        if i == 0 {
            push_with_first(&mut out, token, char::to_lowercase);
        } else {
            push_with_first(&mut out, token, char::to_uppercase);
        }
    }
    out
}

/// Name of the subscribe function for an event callable: `"on"` + UpperCamel.
pub fn to_subscribe_name(callable: &str) -> String {
    let mut out = String::with_capacity(callable.len() + 2);
    out.push_str("on");
    push_with_first(&mut out, callable, char::to_uppercase);
    out
}

fn push_with_first<I>(out: &mut String, token: &str, first: fn(char) -> I)
where
    I: Iterator<Item = char>,
{
    let mut chars = token.chars();
    if let Some(c) = chars.next() {
        out.extend(first(c));
        out.push_str(chars.as_str());
    }
}
