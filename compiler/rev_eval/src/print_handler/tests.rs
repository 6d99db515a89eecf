use super::*;

#[test]
fn buffer_captures_lines() {
    let handler = buffer_handler();
    handler.println("a <- 1");
    handler.print("[ 1, 2 ]");
    assert_eq!(handler.output(), "a <- 1\n[ 1, 2 ]");
}

#[test]
fn take_output_drains_buffer() {
    let handler = buffer_handler();
    handler.println("first");
    assert_eq!(handler.take_output(), "first\n");
    assert_eq!(handler.output(), "");
    handler.println("second");
    assert_eq!(handler.take_output(), "second\n");
}

#[test]
fn silent_discards() {
    let handler = silent_handler();
    handler.println("hidden");
    assert_eq!(handler.output(), "");
    assert!(!handler.is_capturing());
}

#[test]
fn stdout_captures_nothing() {
    let handler = stdout_handler();
    assert_eq!(handler.take_output(), "");
}

#[test]
fn clones_share_buffer() {
    let handler = buffer_handler();
    let other = handler.clone();
    other.println("shared");
    assert_eq!(handler.output(), "shared\n");
    assert!(handler.is_capturing());
}
