use chrono::NaiveDate;
use kayanet_core::{
    AdditionType, Animal, AnimalStatus, AnimalType, FarmService, Gender, HealthRecordType,
    MemoryRecordStore, NewHealthRecord, NewTransaction, ServiceError, SqliteRecordStore,
    TransactionType, ValidationError,
};

fn service() -> FarmService<MemoryRecordStore> {
    let service = FarmService::new(MemoryRecordStore::new());
    service.initialize().unwrap();
    service
}

fn animal(id: &str) -> Animal {
    Animal {
        id: id.to_string(),
        animal_type: AnimalType::Sheep,
        gender: Gender::Ewe,
        birth_date: None,
        purchase_cost: 100.0,
        notes: String::new(),
        status: AnimalStatus::Active,
        addition_type: AdditionType::Purchase,
        date_added: None,
        extra: serde_json::Map::new(),
    }
}

fn sale(sheep_id: &str) -> NewTransaction {
    NewTransaction {
        kind: TransactionType::Sale,
        sheep_id: Some(sheep_id.to_string()),
        amount: 250.0,
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        description: "market sale".to_string(),
    }
}

fn death(sheep_id: &str) -> NewHealthRecord {
    NewHealthRecord {
        sheep_id: sheep_id.to_string(),
        kind: HealthRecordType::Death,
        weight: None,
        medication: String::new(),
        date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
        notes: "found in paddock".to_string(),
    }
}

#[test]
fn operations_before_initialize_are_rejected() {
    let service = FarmService::new(MemoryRecordStore::new());

    assert!(matches!(service.get_animals(), Err(ServiceError::NotReady)));
    assert!(matches!(
        service.add_animal(animal("S-1")),
        Err(ServiceError::NotReady)
    ));
    assert!(matches!(
        service.add_transaction(sale("S-1")),
        Err(ServiceError::NotReady)
    ));

    // Nothing reached the store.
    service.initialize().unwrap();
    assert!(service.get_animals().unwrap().is_empty());
    assert!(service.get_transactions().unwrap().is_empty());
}

#[test]
fn add_animal_forces_active_status() {
    let service = service();
    let mut draft = animal("S-1");
    draft.status = AnimalStatus::Sold;
    service.add_animal(draft).unwrap();

    let animals = service.get_animals().unwrap();
    assert_eq!(animals[0].status, AnimalStatus::Active);
    assert!(animals[0].date_added.is_some());
}

#[test]
fn duplicate_animal_id_is_rejected_and_collection_unchanged() {
    let service = service();
    service.add_animal(animal("S-1")).unwrap();

    let mut second = animal("S-1");
    second.notes = "imposter".to_string();
    let err = service.add_animal(second).unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateId(id) if id == "S-1"));

    let animals = service.get_animals().unwrap();
    assert_eq!(animals.len(), 1);
    assert_eq!(animals[0].notes, "");
}

#[test]
fn birth_addition_carries_no_purchase_cost() {
    let service = service();
    let mut draft = animal("S-1");
    draft.addition_type = AdditionType::Birth;
    draft.purchase_cost = 80.0;
    service.add_animal(draft).unwrap();

    assert_eq!(service.get_animals().unwrap()[0].purchase_cost, 0.0);
}

#[test]
fn invalid_gender_for_species_is_rejected() {
    let service = service();
    let mut draft = animal("G-1");
    draft.animal_type = AnimalType::Goat;
    draft.gender = Gender::Ewe;
    let err = service.add_animal(draft).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::GenderMismatch { .. })
    ));
}

#[test]
fn sale_marks_animal_sold_and_generates_timestamp_id() {
    let service = service();
    service.add_animal(animal("S-1")).unwrap();

    let transaction = service.add_transaction(sale("S-1")).unwrap();
    assert!(transaction.id.parse::<i64>().is_ok());

    let animals = service.get_animals().unwrap();
    assert_eq!(animals[0].status, AnimalStatus::Sold);
    assert_eq!(service.get_transactions().unwrap().len(), 1);
}

#[test]
fn sale_of_missing_or_inactive_animal_is_rejected() {
    let service = service();
    service.add_animal(animal("S-1")).unwrap();
    service.add_transaction(sale("S-1")).unwrap();

    let err = service.add_transaction(sale("S-1")).unwrap_err();
    assert!(matches!(err, ServiceError::AnimalNotActive(id) if id == "S-1"));

    let err = service.add_transaction(sale("ghost")).unwrap_err();
    assert!(matches!(err, ServiceError::AnimalNotFound(id) if id == "ghost"));

    // The failed sales persisted nothing.
    assert_eq!(service.get_transactions().unwrap().len(), 1);
}

#[test]
fn sale_without_animal_reference_is_a_validation_error() {
    let service = service();
    let mut draft = sale("S-1");
    draft.sheep_id = None;
    let err = service.add_transaction(draft).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::MissingSaleAnimal)
    ));
}

#[test]
fn deleting_a_sale_reverts_the_animal_to_active() {
    let service = service();
    service.add_animal(animal("S-1")).unwrap();
    let transaction = service.add_transaction(sale("S-1")).unwrap();

    service.delete_transaction(&transaction.id).unwrap();

    assert_eq!(
        service.get_animals().unwrap()[0].status,
        AnimalStatus::Active
    );
    assert!(service.get_transactions().unwrap().is_empty());
}

#[test]
fn deleting_a_sale_reverts_even_a_dead_animal() {
    // Preserved source behavior, flagged for product clarification: the
    // revert is unconditional.
    let service = service();
    service.add_animal(animal("S-1")).unwrap();
    let transaction = service.add_transaction(sale("S-1")).unwrap();
    service.add_health_record(death("S-1")).unwrap();
    assert_eq!(service.get_animals().unwrap()[0].status, AnimalStatus::Dead);

    service.delete_transaction(&transaction.id).unwrap();
    assert_eq!(
        service.get_animals().unwrap()[0].status,
        AnimalStatus::Active
    );
}

#[test]
fn deleting_an_expense_touches_no_animal() {
    let service = service();
    service.add_animal(animal("S-1")).unwrap();
    let expense = service
        .add_transaction(NewTransaction {
            kind: TransactionType::Expense,
            sheep_id: None,
            amount: 30.0,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            description: "feed".to_string(),
        })
        .unwrap();

    service.delete_transaction(&expense.id).unwrap();
    assert_eq!(
        service.get_animals().unwrap()[0].status,
        AnimalStatus::Active
    );
}

#[test]
fn editing_a_sale_skips_the_active_check_but_still_marks_sold() {
    // Preserved source behavior: only creation validates active status.
    let service = service();
    service.add_animal(animal("S-1")).unwrap();
    service.add_animal(animal("S-2")).unwrap();
    let mut transaction = service.add_transaction(sale("S-1")).unwrap();
    service.add_health_record(death("S-2")).unwrap();

    // Re-assign the sale to the dead animal; the edit succeeds.
    transaction.sheep_id = Some("S-2".to_string());
    service.update_transaction(transaction).unwrap();

    let animals = service.get_animals().unwrap();
    let s2 = animals.iter().find(|a| a.id == "S-2").unwrap();
    assert_eq!(s2.status, AnimalStatus::Sold);
}

#[test]
fn editing_a_sale_still_requires_the_animal_to_exist() {
    let service = service();
    service.add_animal(animal("S-1")).unwrap();
    let mut transaction = service.add_transaction(sale("S-1")).unwrap();

    transaction.sheep_id = Some("ghost".to_string());
    let err = service.update_transaction(transaction).unwrap_err();
    assert!(matches!(err, ServiceError::AnimalNotFound(id) if id == "ghost"));
}

#[test]
fn updating_a_missing_transaction_is_rejected() {
    let service = service();
    service.add_animal(animal("S-1")).unwrap();
    let mut transaction = service.add_transaction(sale("S-1")).unwrap();
    transaction.id = "nope".to_string();
    let err = service.update_transaction(transaction).unwrap_err();
    assert!(matches!(err, ServiceError::TransactionNotFound(id) if id == "nope"));
}

#[test]
fn death_record_marks_animal_dead_for_good() {
    let service = service();
    service.add_animal(animal("S-1")).unwrap();
    let record = service.add_health_record(death("S-1")).unwrap();

    assert_eq!(service.get_animals().unwrap()[0].status, AnimalStatus::Dead);

    // Deleting the death record does not revive the animal.
    service.delete_health_record(&record.id).unwrap();
    assert_eq!(service.get_animals().unwrap()[0].status, AnimalStatus::Dead);
    assert!(service.get_health_records().unwrap().is_empty());
}

#[test]
fn health_record_for_missing_animal_is_rejected() {
    let service = service();
    let err = service.add_health_record(death("ghost")).unwrap_err();
    assert!(matches!(err, ServiceError::AnimalNotFound(id) if id == "ghost"));
    assert!(service.get_health_records().unwrap().is_empty());
}

#[test]
fn editing_a_health_record_to_death_applies_the_side_effect() {
    let service = service();
    service.add_animal(animal("S-1")).unwrap();
    let mut record = service
        .add_health_record(NewHealthRecord {
            sheep_id: "S-1".to_string(),
            kind: HealthRecordType::Weight,
            weight: Some(48.0),
            medication: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            notes: String::new(),
        })
        .unwrap();
    assert_eq!(
        service.get_animals().unwrap()[0].status,
        AnimalStatus::Active
    );

    record.kind = HealthRecordType::Death;
    service.update_health_record(record).unwrap();
    assert_eq!(service.get_animals().unwrap()[0].status, AnimalStatus::Dead);
}

#[test]
fn deleting_an_animal_leaves_orphaned_references() {
    let service = service();
    service.add_animal(animal("S-1")).unwrap();
    let transaction = service.add_transaction(sale("S-1")).unwrap();

    service.delete_animal("S-1").unwrap();
    assert!(service.get_animals().unwrap().is_empty());

    // The sale still exists and references the deleted animal; deleting it
    // now reverts nothing.
    assert_eq!(service.get_transactions().unwrap().len(), 1);
    service.delete_transaction(&transaction.id).unwrap();
    assert!(service.get_animals().unwrap().is_empty());
}

#[test]
fn generated_ids_are_unique_within_a_collection() {
    let service = service();
    service.add_animal(animal("S-1")).unwrap();
    service.add_animal(animal("S-2")).unwrap();

    let first = service.add_transaction(sale("S-1")).unwrap();
    let second = service.add_transaction(sale("S-2")).unwrap();
    assert_ne!(first.id, second.id);
}

#[test]
fn protocols_work_the_same_on_the_durable_backend() {
    let service = FarmService::new(SqliteRecordStore::open_in_memory().unwrap());
    service.initialize().unwrap();

    service.add_animal(animal("S-1")).unwrap();
    let transaction = service.add_transaction(sale("S-1")).unwrap();
    assert_eq!(service.get_animals().unwrap()[0].status, AnimalStatus::Sold);

    service.delete_transaction(&transaction.id).unwrap();
    assert_eq!(
        service.get_animals().unwrap()[0].status,
        AnimalStatus::Active
    );
}
