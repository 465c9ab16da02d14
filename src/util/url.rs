//! Query-string helpers.

use url::form_urlencoded::Serializer;

/// Append form-encoded `params` to `url`.
///
/// An empty parameter list returns the url unchanged. Otherwise the encoded
/// pairs are joined with `&` and attached with `&` when the url already has a
/// query, or `?` when it does not.
pub fn add_url_parameters<I, K, V>(url: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut query = Serializer::new(String::new());
    let mut appended = false;
    for (key, value) in params {
        query.append_pair(key.as_ref(), value.as_ref());
        appended = true;
    }
    if !appended {
        return url.to_string();
    }

    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{}", query.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_PARAMS: [(&str, &str); 0] = [];

    #[test]
    fn empty_parameters_leave_url_unchanged() {
        assert_eq!(add_url_parameters("http://x/y", NO_PARAMS), "http://x/y");
    }

    #[test]
    fn first_parameter_starts_query() {
        assert_eq!(add_url_parameters("http://x/y", [("a", "1")]), "http://x/y?a=1");
    }

    #[test]
    fn existing_query_is_extended() {
        assert_eq!(
            add_url_parameters("http://x/y?b=2", [("a", "1")]),
            "http://x/y?b=2&a=1"
        );
    }

    #[test]
    fn reserved_characters_are_encoded() {
        let url = add_url_parameters(
            "/search",
            vec![("q".to_string(), "rust & go".to_string()), ("page".into(), "2".into())],
        );
        assert_eq!(url, "/search?q=rust+%26+go&page=2");
    }
}
