use std::io::Cursor;

use csv_batchload::data::Value;
use csv_batchload::import::{ImportRequest, run};
use csv_batchload::io_utils::Dialect;
use csv_batchload::mapping::FieldMapping;
use csv_batchload::schema::{FieldSpec, FieldType, Schema};
use csv_batchload::store::MemoryStore;
use csv_batchload::template::template_labels;

fn order_schema() -> Schema {
    Schema::new(vec![
        FieldSpec::new("customer", FieldType::String)
            .required()
            .labeled("Customer"),
        FieldSpec::new("quantity", FieldType::Integer)
            .required()
            .labeled("Quantity"),
        FieldSpec::new("shipped", FieldType::Date).labeled("Shipped"),
    ])
}

#[test]
fn template_marks_required_fields() {
    assert_eq!(
        template_labels(&order_schema()),
        vec!["Customer*", "Quantity*", "Shipped"]
    );
}

#[test]
fn filled_template_round_trips_into_one_record() {
    let schema = order_schema();

    // Render the template header exactly as the template command would,
    // then fill one compliant data row per schema field.
    let mut document = Vec::new();
    {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(&mut document);
        writer.write_record(template_labels(&schema)).unwrap();
        writer
            .write_record(["Acme Ltd", "12", "2024-05-06"])
            .unwrap();
        writer.flush().unwrap();
    }

    let request = ImportRequest {
        input: Box::new(Cursor::new(document)),
        has_headers: true,
        dialect: Dialect::default(),
        schema,
        mapping: FieldMapping::keyed(),
    };
    let mut store = MemoryStore::new();
    let outcome = run(request, &mut store).expect("run");

    assert!(outcome.is_committed());
    assert_eq!(store.len(), 1);
    let record = &store.records()[0];
    assert_eq!(
        record.get("customer"),
        Some(&Value::String("Acme Ltd".to_string()))
    );
    assert_eq!(record.get("quantity"), Some(&Value::Integer(12)));
    assert_eq!(
        record.get("shipped"),
        Some(&Value::Date(
            chrono::NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
        ))
    );
}
