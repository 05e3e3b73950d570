// core/tests/test_validation.rs
use apexcoach_core::{validate_csv_file, MAX_FILE_SIZE_BYTES, MIN_FILE_SIZE_BYTES};

#[test]
fn rejects_non_csv_extension() {
    let v = validate_csv_file("session.txt", 5000);
    assert!(!v.valid);
    let msg = v.error.expect("error message");
    assert!(msg.contains("CSV"), "format error should name the expected extension: {msg}");
}

#[test]
fn accepts_csv_extension_case_insensitively() {
    assert!(validate_csv_file("SESSION.CSV", 5000).valid);
    assert!(validate_csv_file("mychron5_export.Csv", 5000).valid);
}

#[test]
fn extension_is_checked_before_size() {
    // 10 bytes er også for lite, men format-feilen skal vinne
    let v = validate_csv_file("data.txt", 10);
    assert!(!v.valid);
    assert!(v.error.unwrap().contains("CSV"));
}

#[test]
fn size_boundaries_are_inclusive() {
    // nedre grense: nøyaktig 1000 bytes er gyldig, 999 er ikke
    assert!(validate_csv_file("a.csv", MIN_FILE_SIZE_BYTES).valid);
    let v = validate_csv_file("a.csv", MIN_FILE_SIZE_BYTES - 1);
    assert!(!v.valid);
    assert!(v.error.unwrap().contains("small"));

    // øvre grense: nøyaktig 50 MiB er gyldig, én byte over er ikke
    assert!(validate_csv_file("a.csv", MAX_FILE_SIZE_BYTES).valid);
    let v = validate_csv_file("a.csv", MAX_FILE_SIZE_BYTES + 1);
    assert!(!v.valid);
    let msg = v.error.unwrap();
    assert!(msg.contains("50"), "size error should state the limit: {msg}");
}

#[test]
fn size_error_embeds_actual_size() {
    let v = validate_csv_file("big.csv", 60 * 1024 * 1024);
    let msg = v.error.expect("error message");
    assert!(msg.contains("60.00"), "expected actual size in MB: {msg}");
}
