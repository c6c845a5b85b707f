use import_ir::logger::{init_log, LogInitError};

#[test]
fn logger_is_installed_once() {
    assert!(init_log().is_ok());
    log::info!("logger installed");
    assert!(matches!(init_log(), Err(LogInitError::SetLogger(_))));
}
