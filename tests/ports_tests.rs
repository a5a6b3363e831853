use tcp_scan_rs::error::PortSpecError;
use tcp_scan_rs::ports::{load_ports_from_path, parse_port_list, parse_ports_file, port_range};

#[test]
fn file_and_list_accept_the_same_entries() {
    let file = "21-23   # ftp..telnet\n80,443\n\n  # nothing here\n";
    let from_file = parse_ports_file(file);
    let from_list = parse_port_list("21-23,80,443");
    assert_eq!(from_file, from_list);
    assert_eq!(from_file.ports, vec![21, 22, 23, 80, 443]);
}

#[test]
fn bad_file_line_is_a_warning_not_an_error() {
    let parsed = parse_ports_file("22\n65536\n443-80\n3306 # mysql\n22\n");
    assert_eq!(parsed.ports, vec![22, 3306]);
    assert_eq!(
        parsed.rejected,
        vec![
            PortSpecError::OutOfRange(65536),
            PortSpecError::InvertedRange { start: 443, end: 80 },
        ]
    );
    assert_eq!(parsed.duplicates, vec![22]);
}

#[test]
fn missing_ports_file_is_an_error() {
    let err = load_ports_from_path("/nonexistent/tcp-scan-rs/ports.txt").unwrap_err();
    assert!(err.to_string().contains("failed to read ports file"));
}

#[test]
fn bad_entries_are_skipped_not_fatal() {
    let parsed = parse_port_list("80,http,443");
    assert_eq!(parsed.ports, vec![80, 443]);
    assert_eq!(parsed.rejected, vec![PortSpecError::InvalidValue("http".into())]);
}

#[test]
fn default_range_is_first_1024() {
    let ports = port_range(1, 1024).unwrap();
    assert_eq!(ports.len(), 1024);
    assert_eq!(ports.first(), Some(&1));
    assert_eq!(ports.last(), Some(&1024));
}
