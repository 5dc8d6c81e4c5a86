use opsdeck_types::{Keyed, ProductRecord, Resource, Role, UserRecord, ValidationError};
use pretty_assertions::assert_eq;

fn product(name: &str, price: f64) -> ProductRecord {
    ProductRecord {
        name: name.to_string(),
        description: "A thing".to_string(),
        price,
    }
}

// ── Serialization ────────────────────────────────────────────────

#[test]
fn role_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
}

#[test]
fn role_defaults_to_user() {
    assert_eq!(Role::default(), Role::User);
}

#[test]
fn user_record_fields_do_not_include_key() {
    let user = UserRecord {
        auth_uid: "uid-1".into(),
        email: "a@b.test".into(),
        name: "Ada".into(),
        role: Role::Admin,
    };
    let value = serde_json::to_value(&user).unwrap();
    let map = value.as_object().unwrap();
    assert!(!map.contains_key("id"));
    assert_eq!(map["role"], "admin");
}

#[test]
fn keyed_serializes_with_flattened_fields() {
    let keyed = Keyed::new("k1", product("Widget", 5.0));
    let value = serde_json::to_value(&keyed).unwrap();
    assert_eq!(value["id"], "k1");
    assert_eq!(value["name"], "Widget");
    assert_eq!(value["price"], 5.0);
}

#[test]
fn record_missing_name_deserializes_as_empty() {
    let record: ProductRecord = serde_json::from_str(r#"{"price": 3.5}"#).unwrap();
    assert_eq!(record.name, "");
    assert_eq!(record.sort_key(), "");
    assert_eq!(record.price, 3.5);
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn valid_product_passes() {
    assert!(product("Widget", 5.0).validate().is_ok());
    assert!(product("Penny sweet", 0.01).validate().is_ok());
}

#[test]
fn empty_product_name_rejected() {
    let err = product("  ", 5.0).validate().unwrap_err();
    assert_eq!(
        err,
        ValidationError::EmptyField {
            resource: "products",
            field: "name",
        }
    );
}

#[test]
fn empty_product_description_rejected() {
    let mut record = product("Widget", 5.0);
    record.description = " ".to_string();
    assert_eq!(
        record.validate().unwrap_err(),
        ValidationError::EmptyField {
            resource: "products",
            field: "description",
        }
    );
}

#[test]
fn non_positive_price_rejected() {
    // A free product is not sellable; zero is rejected like a negative.
    for price in [0.0, -1.0] {
        let err = product("Widget", price).validate().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidNumber { field: "price", .. }));
    }
}

#[test]
fn nan_price_rejected() {
    assert!(product("Widget", f64::NAN).validate().is_err());
}

#[test]
fn user_requires_email_and_name() {
    let mut user = UserRecord {
        auth_uid: "uid-1".into(),
        email: "a@b.test".into(),
        name: "Ada".into(),
        role: Role::User,
    };
    assert!(user.validate().is_ok());

    user.name.clear();
    assert!(matches!(
        user.validate().unwrap_err(),
        ValidationError::EmptyField { field: "name", .. }
    ));

    user.name = "Ada".into();
    user.email = " ".into();
    assert!(matches!(
        user.validate().unwrap_err(),
        ValidationError::EmptyField { field: "email", .. }
    ));
}
