use chrono::{DateTime, Utc};
use cosmos_odm_derive::CosmosEntity;
use fake::faker::lorem::en::Word;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, CosmosEntity)]
#[serde(rename_all = "camelCase")]
#[entity(container = "people", partition_key = "last_name", ru = 1000)]
pub struct Person {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub hobbies: Vec<String>,
    pub registered_at: Option<DateTime<Utc>>,
}

impl Person {
    pub fn new(id: &str, first_name: &str, last_name: &str, age: u32) -> Self {
        Person {
            id: id.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            age,
            hobbies: Vec::new(),
            registered_at: None,
        }
    }
}

/// Entity keyed by a renamed numeric id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, CosmosEntity)]
#[entity(container = "orders", auto_create_container = true)]
pub struct PurchaseOrder {
    #[entity(id)]
    #[serde(rename = "orderNo")]
    pub order_no: u64,
    pub customer: String,
    #[serde(rename = "total_cents")]
    pub total: i64,
    #[serde(skip)]
    pub cached_summary: Option<String>,
}

/// Unpartitioned entity whose id is generated when missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, CosmosEntity)]
pub struct Note {
    pub id: Option<String>,
    pub text: String,
    pub tags: Vec<String>,
}

pub fn generate_person() -> Person {
    let mut rng = rand::rng();
    let hobbies = (0..rng.random_range(0..3)).map(|_| Word().fake::<String>()).collect();
    Person {
        id: uuid::Uuid::new_v4().to_string(),
        first_name: FirstName().fake(),
        last_name: LastName().fake(),
        age: rng.random_range(18..90),
        hobbies,
        registered_at: DateTime::from_timestamp(rng.random_range(946_684_800..1_893_456_000), 0),
    }
}

pub fn generate_people(count: usize) -> Vec<Person> {
    (0..count).map(|_| generate_person()).collect()
}
