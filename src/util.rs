/// Splits a fully-qualified host into its apex domain (the last two labels)
/// and the subdomain in front of it.
///
/// For example,
/// ```text
/// "home.example.com"  ---> ("example.com", "home")
/// "a.b.example.com"   ---> ("example.com", "a.b")
/// "example.com"       ---> ("example.com", "")
/// ```
pub fn split_host(host: &str) -> (&str, &str) {
    let mut dots = host.rmatch_indices('.').map(|(i, _)| i);

    match (dots.next(), dots.next()) {
        (Some(_), Some(split)) => (&host[split + 1..], &host[..split]),
        _ => (host, ""),
    }
}
