use super::*;

fn cols(t: &DataTable) -> Vec<&str> {
    t.columns().iter().map(String::as_str).collect()
}

#[test]
fn csv_with_header_and_padding() {
    let t = DataTable::from_csv_reader("t, price\n0, 10.5\n1 ,11\n2,9.75\n".as_bytes()).unwrap();
    assert_eq!(cols(&t), ["t", "price"]);
    assert_eq!(t.len(), 3);
    assert_eq!(t.column("price"), Some(vec![10.5, 11.0, 9.75]));
    assert_eq!(t.column("missing"), None);
}

#[test]
fn csv_errors_name_the_cell() {
    let err = DataTable::from_csv_reader("x,y\n1,2\n3,abc\n".as_bytes()).unwrap_err();
    assert!(
        matches!(&err, ManimlineError::MalformedInput(m) if m.contains("row 2") && m.contains("'y'")),
        "{err}"
    );
    assert!(DataTable::from_csv_reader("x,y\n1,2\n3\n".as_bytes()).is_err());
    assert!(DataTable::from_csv_reader("x,y\n".as_bytes()).is_err());
    assert!(DataTable::from_csv_reader("".as_bytes()).is_err());
    assert!(DataTable::from_csv_reader("x,x\n1,2\n".as_bytes()).is_err());
    assert!(DataTable::from_csv_reader("x\nNaN\n".as_bytes()).is_err());
}

#[test]
fn json_records_keep_key_order() {
    let t = DataTable::from_json_str(r#"[{"t": 0, "b": 1, "a": 2}, {"a": 5, "t": 1, "b": "4"}]"#)
        .unwrap();
    assert_eq!(cols(&t), ["t", "b", "a"]);
    assert_eq!(t.rows(), [vec![0.0, 1.0, 2.0], vec![1.0, 4.0, 5.0]]);

    let err = DataTable::from_json_str(r#"[{"t": 0, "b": 1}, {"t": 1}]"#).unwrap_err();
    assert!(err.to_string().contains("column 'b'"), "{err}");
}

#[test]
fn json_arrays_values_and_columns() {
    let rows = DataTable::from_json_str("[[0, 1], [2, 3.5]]").unwrap();
    assert_eq!(cols(&rows), ["col_0", "col_1"]);
    assert_eq!(rows.rows()[1], [2.0, 3.5]);

    let values = DataTable::from_json_str("[3, 1, 2]").unwrap();
    assert_eq!(cols(&values), ["value"]);
    assert_eq!(values.column("value"), Some(vec![3.0, 1.0, 2.0]));

    let columns = DataTable::from_json_str(r#"{"y": [1, 2], "x": [0, 1]}"#).unwrap();
    assert_eq!(cols(&columns), ["y", "x"]);
    assert_eq!(columns.rows(), [vec![1.0, 0.0], vec![2.0, 1.0]]);
}

#[test]
fn malformed_json_tables_are_rejected() {
    for bad in [
        "[]",
        "{}",
        "42",
        "not json",
        r#"[[1, 2], [3]]"#,
        r#"[1, "x"]"#,
        r#"{"x": [1, 2], "y": [1]}"#,
        r#"{"x": 1}"#,
        r#"[{"x": null}]"#,
    ] {
        assert!(
            matches!(DataTable::from_json_str(bad), Err(ManimlineError::MalformedInput(_))),
            "{bad}"
        );
    }
}

#[test]
fn load_dispatches_on_extension() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("series.CSV");
    std::fs::write(&csv, "x,y\n0,1\n1,4\n").unwrap();
    assert_eq!(DataTable::load(&csv).unwrap().len(), 2);

    let json = dir.path().join("points.json");
    std::fs::write(&json, "[[0, 0, 1]]").unwrap();
    assert_eq!(DataTable::load(&json).unwrap().width(), 3);

    let txt = dir.path().join("notes.txt");
    std::fs::write(&txt, "x,y\n").unwrap();
    assert!(matches!(DataTable::load(&txt), Err(ManimlineError::MalformedInput(_))));

    let missing = DataTable::load(dir.path().join("gone.csv")).unwrap_err();
    assert!(missing.to_string().contains("gone.csv"), "{missing}");

    std::fs::write(&json, "[1, true]").unwrap();
    let err = DataTable::load(&json).unwrap_err();
    assert!(err.to_string().contains("points.json"), "{err}");
}

#[test]
fn sample_keeps_ends_and_spacing() {
    let rows = (0..10).map(|i| vec![f64::from(i)]).collect();
    let t = DataTable::new(vec!["i".into()], rows).unwrap();
    let firsts: Vec<f64> = t.sample(4).iter().map(|r| r[0]).collect();
    assert_eq!(firsts, [0.0, 3.0, 6.0, 9.0]);
    assert_eq!(t.sample(20).len(), 10);
}

#[test]
fn digest_tracks_names_and_values() {
    let a = DataTable::new(vec!["x".into()], vec![vec![1.0]]).unwrap();
    let b = DataTable::new(vec!["y".into()], vec![vec![1.0]]).unwrap();
    let c = DataTable::new(vec!["x".into()], vec![vec![2.0]]).unwrap();
    assert_eq!(a.digest(), a.clone().digest());
    assert_ne!(a.digest(), b.digest());
    assert_ne!(a.digest(), c.digest());
    assert_eq!(a.digest().len(), 64);
}

#[test]
fn preview_lists_the_first_rows() {
    let t = DataTable::from_json_str("[[0, 1.5], [1, 2], [2, 2.5]]").unwrap();
    assert_eq!(
        t.preview(2),
        "3 rows, columns: col_0, col_1\ncol_0,col_1\n0,1.5\n1,2\n... (1 more)"
    );
}
