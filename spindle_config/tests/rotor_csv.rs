use rstest::rstest;
use spindle_config::RotorTable;

const GOOD: &str = "name,radius_cm\nfixed-8x15,11.0\nswing-4x50,16.5\n";

#[test]
fn loads_presets_with_strict_headers() {
    let table = RotorTable::from_csv_str(GOOD).expect("load presets");
    assert_eq!(table.rows().len(), 2);
    let rotor = table.find("swing-4x50").expect("preset exists");
    assert_eq!(rotor.radius_cm, 16.5);
    assert!(table.find("missing").is_none());
}

#[rstest]
#[case("radius_cm,name\n11.0,fixed\n", "headers")]
#[case("name,radius\nfixed,11.0\n", "headers")]
#[case("name,radius_cm\n,11.0\n", "empty rotor name")]
#[case("name,radius_cm\nfixed,-2.0\n", "radius out of range")]
#[case("name,radius_cm\nfixed,250.0\n", "radius out of range")]
#[case("name,radius_cm\nfixed,11.0\nfixed,12.0\n", "duplicate")]
#[case("name,radius_cm\n", "no presets")]
fn rejects_malformed_presets(#[case] csv: &str, #[case] needle: &str) {
    let err = RotorTable::from_csv_str(csv).expect_err("must reject");
    assert!(
        format!("{err}").contains(needle),
        "error for {csv:?} should mention {needle}: {err}"
    );
}

#[test]
fn whitespace_is_trimmed() {
    let table =
        RotorTable::from_csv_str("name,radius_cm\n fixed-8x15 , 11.0 \n").expect("trimmed load");
    assert!(table.find("fixed-8x15").is_some());
}
