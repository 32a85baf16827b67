use cosmos_odm::common::PartitionKey;
use cosmos_odm::errors::ErrorKind;
use cosmos_odm::query::{CosmosPageRequest, Sort};
use cosmos_odm::repository::CosmosRepository;
use cosmos_odm_int_test::fixtures::{generate_people, Note, Person, PurchaseOrder};
use cosmos_odm_int_test::test_util::{cleanup, create_test_context, run_test};
use serde_json::Value;
use std::collections::HashSet;

#[test]
fn test_save_and_find() {
    run_test(
        create_test_context,
        |ctx| {
            let repo = ctx.repositories().repository::<Person>()?;
            let people = generate_people(5);
            let saved = repo.save_all(&people)?;
            assert_eq!(saved, people);

            for person in &people {
                let found = repo.find_by_id(Value::from(person.id.as_str()))?;
                assert_eq!(found.as_ref(), Some(person));

                let scoped = repo.find_by_id_with_partition(
                    Value::from(person.id.as_str()),
                    PartitionKey::from(person.last_name.as_str()),
                )?;
                assert_eq!(scoped.as_ref(), Some(person));
            }
            assert!(repo.find_by_id(Value::from("missing"))?.is_none());
            assert!(repo.exists_by_id(Value::from(people[0].id.as_str()))?);
            assert_eq!(repo.count()?, 5);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_save_replaces_existing() {
    run_test(
        create_test_context,
        |ctx| {
            let repo = ctx.repositories().repository::<Person>()?;
            let mut person = Person::new("p1", "John", "Smith", 40);
            repo.save(&person)?;
            person.first_name = "Johnny".into();
            repo.save(&person)?;

            let all = repo.find_all()?;
            assert_eq!(all.len(), 1);
            assert_eq!(all[0].first_name, "Johnny");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_all_by_partition_and_ids() {
    run_test(
        create_test_context,
        |ctx| {
            let repo = ctx.repositories().repository::<Person>()?;
            repo.save_all(&[
                Person::new("1", "Ann", "Smith", 30),
                Person::new("2", "Bob", "Smith", 31),
                Person::new("3", "Cid", "Jones", 32),
            ])?;

            let smiths = repo.find_all_by_partition(PartitionKey::from("Smith"))?;
            assert_eq!(smiths.len(), 2);

            let by_ids = repo.find_all_by_ids(vec![Value::from("1"), Value::from("3"), Value::from("4")])?;
            let ids: HashSet<String> = by_ids.into_iter().map(|p| p.id).collect();
            assert_eq!(ids, HashSet::from(["1".to_string(), "3".to_string()]));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sorted_and_paged() {
    run_test(
        create_test_context,
        |ctx| {
            let repo = ctx.repositories().repository::<Person>()?;
            let people = generate_people(12);
            repo.save_all(&people)?;

            let sorted = repo.find_all_sorted(Sort::by_desc("age").then("id"))?;
            assert_eq!(sorted.len(), 12);
            assert!(sorted.windows(2).all(|w| w[0].age >= w[1].age));

            let mut request = Some(CosmosPageRequest::first(5)?);
            let mut sizes = Vec::new();
            while let Some(page_request) = request {
                let page = repo.find_all_paged(page_request)?;
                sizes.push(page.number_of_elements());
                request = page.next_pageable();
            }
            assert_eq!(sizes, vec![5, 5, 2]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_operations() {
    run_test(
        create_test_context,
        |ctx| {
            let repo = ctx.repositories().repository::<Person>()?;
            let people = generate_people(6);
            repo.save_all(&people)?;

            repo.delete_by_id(Value::from(people[0].id.as_str()))?;
            assert_eq!(repo.count()?, 5);

            repo.delete_by_id_with_partition(
                Value::from(people[1].id.as_str()),
                PartitionKey::from(people[1].last_name.as_str()),
            )?;
            assert_eq!(repo.count()?, 4);

            repo.delete(&people[2])?;
            assert_eq!(repo.count()?, 3);

            repo.delete_entities(&people[3..5])?;
            assert_eq!(repo.count()?, 1);

            repo.delete_all()?;
            assert_eq!(repo.count()?, 0);

            let err = repo.delete(&people[0]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_generated_and_numeric_ids() {
    run_test(
        create_test_context,
        |ctx| {
            let notes = ctx.repositories().repository::<Note>()?;
            let saved = notes.save(&Note {
                id: None,
                text: "draft".into(),
                tags: vec![],
            })?;
            let id = saved.id.clone().unwrap_or_default();
            assert!(!id.is_empty());
            assert_eq!(notes.find_by_id(Value::from(id))?, Some(saved));

            let orders = ctx.repositories().repository::<PurchaseOrder>()?;
            let order = PurchaseOrder {
                order_no: 1001,
                customer: "acme".into(),
                total: 5,
                cached_summary: None,
            };
            orders.save(&order)?;
            assert_eq!(orders.find_by_id(Value::from(1001))?, Some(order.clone()));
            orders.delete(&order)?;
            assert_eq!(orders.count()?, 0);
            Ok(())
        },
        cleanup,
    )
}
