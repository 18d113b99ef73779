/// Turn a configured URL into an Oracle connect string.
///
/// Accepts `jdbc:oracle:thin:@host:port:SID` (rewritten into a connect
/// descriptor), `jdbc:oracle:thin:@//host:port/service` (Easy Connect), and bare
/// Easy Connect strings or TNS aliases.
pub(super) fn connect_string(url: &str) -> String {
    let url = url.trim();
    let rest = url
        .strip_prefix("jdbc:oracle:thin:@")
        .or_else(|| url.strip_prefix("oracle:thin:@"))
        .unwrap_or(url);

    if rest.starts_with("//") || rest.contains('/') || rest.starts_with('(') {
        return rest.to_string();
    }

    let parts: Vec<&str> = rest.split(':').collect();
    match parts.as_slice() {
        [host, port, sid] if !host.is_empty() && port.parse::<u16>().is_ok() => format!(
            "(DESCRIPTION=(ADDRESS=(PROTOCOL=TCP)(HOST={host})(PORT={port}))(CONNECT_DATA=(SID={sid})))"
        ),
        _ => rest.to_string(),
    }
}
