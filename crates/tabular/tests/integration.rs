use tabular::{Cell, ColumnKind, CsvReader, TableReader, TabularError};

const EQUIPMENT: &str = "\
Equipment Name,Type,Flowrate,Pressure,Temperature
Pump-1,Pump,120.5,5.2,110
Pump-2,Pump,130,5.8,115
Valve-1,Valve,60,4.1,105
Valve-2,Valve,65.5,4.4,108
Pump-3,Pump,125,5.5,112
Valve-3,Valve,70,4.0,
Pump-4,Pump,118,5.1,109
";

#[test]
fn test_reads_rows_and_headers() {
    let table = CsvReader::new().read(EQUIPMENT.as_bytes()).unwrap();

    assert_eq!(table.len(), 7);
    let headers: Vec<&str> = table.headers().collect();
    assert_eq!(
        headers,
        vec!["Equipment Name", "Type", "Flowrate", "Pressure", "Temperature"]
    );
    assert!(table.has_columns(&["Type", "Flowrate"]));
    assert!(!table.has_columns(&["Type", "flowrate"]));
}

#[test]
fn test_column_kinds() {
    let table = CsvReader::new().read(EQUIPMENT.as_bytes()).unwrap();

    assert_eq!(table.column("Type").unwrap().kind(), ColumnKind::Text);
    assert_eq!(table.column("Flowrate").unwrap().kind(), ColumnKind::Float);
    assert_eq!(table.column("Temperature").unwrap().kind(), ColumnKind::Int);
}

#[test]
fn test_mean_and_value_counts() {
    let table = CsvReader::new().read(EQUIPMENT.as_bytes()).unwrap();

    let flow = table.column("Flowrate").unwrap().mean().unwrap().unwrap();
    let expected = (120.5 + 130.0 + 60.0 + 65.5 + 125.0 + 70.0 + 118.0) / 7.0;
    assert!((flow - expected).abs() < 1e-9);

    // one missing temperature
    let temp = table.column("Temperature").unwrap();
    assert_eq!(temp.missing_count(), 1);
    let mean = temp.mean().unwrap().unwrap();
    assert!((mean - 659.0 / 6.0).abs() < 1e-9);

    let counts = table.column("Type").unwrap().value_counts();
    assert_eq!(counts.get("Pump"), Some(&4));
    assert_eq!(counts.get("Valve"), Some(&3));
}

#[test]
fn test_head_preserves_column_order() {
    let table = CsvReader::new().read(EQUIPMENT.as_bytes()).unwrap();
    let head = table.head(5);

    assert_eq!(head.len(), 5);
    assert_eq!(head[0].get("Equipment Name"), Some(&Cell::Text("Pump-1".into())));
    assert_eq!(head[0].get("Temperature"), Some(&Cell::Int(110)));

    let json = serde_json::to_string(&head[0]).unwrap();
    assert_eq!(
        json,
        r#"{"Equipment Name":"Pump-1","Type":"Pump","Flowrate":120.5,"Pressure":5.2,"Temperature":110}"#
    );
}

#[test]
fn test_head_shorter_than_table() {
    let table = CsvReader::new().read(b"a\n1\n2\n").unwrap();
    assert_eq!(table.head(5).len(), 2);
}

#[test]
fn test_missing_cells_serialize_as_null() {
    let table = CsvReader::new().read(b"a,b\n1,NA\n2\n").unwrap();
    let head = table.head(5);

    assert_eq!(head[0].get("b"), Some(&Cell::Missing));
    // short row is padded
    assert_eq!(head[1].get("b"), Some(&Cell::Missing));
    assert_eq!(serde_json::to_string(&head[1]).unwrap(), r#"{"a":2,"b":null}"#);
}

#[test]
fn test_header_only() {
    let table = CsvReader::new().read(b"a,b\n").unwrap();
    assert!(table.is_empty());
    assert_eq!(table.column("a").unwrap().mean().unwrap(), None);
}

#[test]
fn test_empty_input() {
    let err = CsvReader::new().read(b"").unwrap_err();
    assert!(matches!(err, TabularError::Empty));
}

#[test]
fn test_long_row_rejected() {
    let err = CsvReader::new().read(b"a,b\n1,2,3\n").unwrap_err();
    assert!(matches!(
        err,
        TabularError::RaggedRow { row: 1, expected: 2, found: 3 }
    ));
}

#[test]
fn test_invalid_utf8_rejected() {
    let err = CsvReader::new().read(b"a,b\n\xff\xfe,1\n").unwrap_err();
    assert!(matches!(err, TabularError::Csv(_)));
}

#[test]
fn test_custom_delimiter() {
    let table = CsvReader::with_delimiter(b';').read(b"a;b\n1;2\n").unwrap();
    assert_eq!(table.column("b").unwrap().mean().unwrap(), Some(2.0));
}

#[test]
fn test_reader_as_trait_object() {
    let reader: Box<dyn TableReader> = Box::new(CsvReader::default());
    let table = reader.read(b"x\n1\n").unwrap();
    assert_eq!(table.len(), 1);
}
