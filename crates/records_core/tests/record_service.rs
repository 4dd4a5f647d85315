use records_core::{
    Address, AddressMatcher, ChangeNotifier, Column, DeleteOutcome, FormError, RecordForm,
    RecordService, RecordStore, RecordValidationError, RecordValues, SaveOutcome, Selection,
    SqliteRecordStore, StoreError, DEFAULT_AUTHORITY,
};
use std::sync::Arc;

fn service() -> RecordService<SqliteRecordStore> {
    RecordService::new(
        SqliteRecordStore::open_in_memory(
            AddressMatcher::for_records(DEFAULT_AUTHORITY).unwrap(),
            Arc::new(ChangeNotifier::new()),
        )
        .unwrap(),
    )
}

fn form(album: &str) -> RecordForm {
    RecordForm {
        album_name: format!("  {album} "),
        band_name: "Björk".to_string(),
        quantity: " 3".to_string(),
        price: "1850 ".to_string(),
        cover: Some("content://media/external/images/12".to_string()),
        supplier_name: "One Little Independent".to_string(),
        supplier_email: " sales@oli.example ".to_string(),
    }
}

#[test]
fn saving_new_form_inserts_trimmed_record() {
    let service = service();

    let outcome = service.save(None, &form("Homogenic")).unwrap();
    let SaveOutcome::Inserted(address) = outcome else {
        panic!("expected insert, got {outcome:?}");
    };
    assert_eq!(outcome.message(), "Record saved");

    let record = service.load(address).unwrap().unwrap();
    assert_eq!(record.album_name, "Homogenic");
    assert_eq!(record.quantity, 3);
    assert_eq!(record.price, 1850);
    assert_eq!(record.supplier_email, "sales@oli.example");
}

#[test]
fn blank_new_form_is_skipped_without_a_write() {
    let service = service();
    let (_handle, events) = service
        .store()
        .notifier()
        .subscribe_channel(Address::Collection);

    let blank = RecordForm {
        album_name: "   ".to_string(),
        ..RecordForm::default()
    };
    let outcome = service.save(None, &blank).unwrap();

    assert_eq!(outcome, SaveOutcome::Skipped);
    assert!(service.list_summaries().unwrap().is_empty());
    assert!(events.try_recv().is_err());
}

#[test]
fn blank_numbers_default_to_zero_on_save() {
    let service = service();
    let mut input = form("Debut");
    input.quantity = String::new();
    input.price = "  ".to_string();

    let SaveOutcome::Inserted(address) = service.save(None, &input).unwrap() else {
        panic!("expected insert");
    };
    let record = service.load(address).unwrap().unwrap();
    assert_eq!((record.quantity, record.price), (0, 0));
}

#[test]
fn non_numeric_quantity_is_a_form_error() {
    let service = service();
    let mut input = form("Post");
    input.quantity = "three".to_string();

    let err = service.save(None, &input).unwrap_err();
    assert!(matches!(
        &err,
        FormError::InvalidNumber {
            column: Column::Quantity,
            input
        } if input == "three"
    ));
    assert_eq!(err.message(), "Please enter a whole number");
}

#[test]
fn partially_filled_form_surfaces_store_validation() {
    let service = service();
    let mut input = form("Vespertine");
    input.supplier_name = " ".to_string();

    let err = service.save(None, &input).unwrap_err();
    assert!(matches!(
        err,
        FormError::Store(StoreError::Validation(RecordValidationError::BlankField(
            Column::SupplierName
        )))
    ));
    assert_eq!(err.message(), "Please fill in every field");
}

#[test]
fn form_without_cover_cannot_be_inserted() {
    let service = service();
    let mut input = form("Medúlla");
    input.cover = None;

    assert!(matches!(
        service.save(None, &input),
        Err(FormError::Store(StoreError::Validation(
            RecordValidationError::MissingField(Column::Cover)
        )))
    ));
}

#[test]
fn saving_existing_record_updates_it_in_place() {
    let service = service();
    let SaveOutcome::Inserted(address) = service.save(None, &form("Volta")).unwrap() else {
        panic!("expected insert");
    };

    let mut edited = RecordForm::from_record(&service.load(address).unwrap().unwrap());
    edited.quantity = "7".to_string();
    let outcome = service.save(Some(address), &edited).unwrap();

    assert_eq!(outcome, SaveOutcome::Updated(1));
    assert_eq!(outcome.message(), "Record updated");
    assert_eq!(service.load(address).unwrap().unwrap().quantity, 7);
    assert_eq!(service.list_summaries().unwrap().len(), 1);
}

#[test]
fn saving_onto_a_vanished_record_reports_not_updated() {
    let service = service();
    let outcome = service.save(Some(Address::Item(77)), &form("Biophilia")).unwrap();

    assert_eq!(outcome, SaveOutcome::NotUpdated);
    assert_eq!(outcome.message(), "Error with updating record");
}

#[test]
fn saving_onto_the_collection_is_refused() {
    let service = service();
    assert!(matches!(
        service.save(Some(Address::Collection), &form("Utopia")),
        Err(FormError::Store(StoreError::UnsupportedOperation {
            operation: "save",
            ..
        }))
    ));
}

#[test]
fn delete_reports_whether_a_row_went_away() {
    let service = service();
    let SaveOutcome::Inserted(address) = service.save(None, &form("Fossora")).unwrap() else {
        panic!("expected insert");
    };

    assert_eq!(service.delete(address).unwrap(), DeleteOutcome::Deleted);
    assert_eq!(service.delete(address).unwrap(), DeleteOutcome::NotDeleted);
    assert_eq!(service.load(address).unwrap(), None);
}

#[test]
fn list_summaries_project_list_columns_in_id_order() {
    let service = service();
    for album in ["Homogenic", "Debut", "Post"] {
        service.save(None, &form(album)).unwrap();
    }
    service
        .store()
        .update(
            Address::Item(2),
            &RecordValues::new().with_quantity(0),
            &Selection::all(),
        )
        .unwrap();

    let summaries = service.list_summaries().unwrap();
    let albums = summaries
        .iter()
        .map(|summary| summary.album_name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(albums, vec!["Homogenic", "Debut", "Post"]);
    assert_eq!(summaries[1].address, Address::Item(2));
    assert_eq!(summaries[1].quantity, 0);

    let json = serde_json::to_value(&summaries[0]).unwrap();
    assert_eq!(json["band_name"], "Björk");
}
