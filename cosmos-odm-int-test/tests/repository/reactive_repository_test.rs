use cosmos_odm::common::PartitionKey;
use cosmos_odm::errors::CosmosError;
use cosmos_odm::params;
use cosmos_odm::query::{CosmosPageRequest, Sort};
use cosmos_odm::repository::query::ReturnShape;
use cosmos_odm_int_test::fixtures::{generate_people, Person};
use cosmos_odm_int_test::test_util::{cleanup, create_test_context, run_test};
use futures::executor::block_on;
use futures::TryStreamExt;
use serde_json::Value;

#[test]
fn test_reactive_crud() {
    run_test(
        create_test_context,
        |ctx| {
            let repo = ctx.reactive_repositories().repository::<Person>()?;
            block_on(async {
                let saved = repo.save(Person::new("1", "Ann", "Smith", 30)).await?;
                assert_eq!(saved.id, "1");
                repo.save(Person::new("2", "Bob", "Jones", 40)).await?;

                let found = repo.find_by_id(Value::from("1")).await?;
                assert_eq!(found.map(|p| p.first_name), Some("Ann".to_string()));
                let scoped = repo
                    .find_by_id_with_partition(Value::from("2"), PartitionKey::from("Jones"))
                    .await?;
                assert!(scoped.is_some());
                assert!(repo.exists_by_id(Value::from("2")).await?);
                assert!(!repo.exists_by_id(Value::from("3")).await?);

                repo.delete_by_id(Value::from("1")).await?;
                repo.delete_by_id_with_partition(Value::from("2"), PartitionKey::from("Jones"))
                    .await?;
                assert_eq!(repo.count().await?, 0);
                Ok::<(), CosmosError>(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_reactive_streams_keep_order() {
    run_test(
        create_test_context,
        |ctx| {
            let repo = ctx.reactive_repositories().repository::<Person>()?;
            block_on(async {
                for person in generate_people(9) {
                    repo.save(person).await?;
                }

                let all: Vec<Person> = repo.find_all().try_collect().await?;
                assert_eq!(all.len(), 9);

                let sorted: Vec<Person> = repo.find_all_sorted(Sort::by("age").then("id")).try_collect().await?;
                assert!(sorted.windows(2).all(|w| w[0].age <= w[1].age));

                let partition = all[0].last_name.clone();
                let in_partition: Vec<Person> = repo
                    .find_all_by_partition(PartitionKey::from(partition.as_str()))
                    .try_collect()
                    .await?;
                assert!(in_partition.iter().all(|p| p.last_name == partition));

                let page = repo.find_all_paged(CosmosPageRequest::first(4)?).await?;
                assert_eq!(page.number_of_elements(), 4);
                assert!(page.has_next());

                repo.delete_all().await?;
                assert_eq!(repo.count().await?, 0);
                Ok::<(), CosmosError>(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_reactive_derived_query() {
    run_test(
        create_test_context,
        |ctx| {
            let repo = ctx.reactive_repositories().repository::<Person>()?;
            block_on(async {
                repo.save(Person::new("1", "Ann", "Smith", 30)).await?;
                repo.save(Person::new("2", "Bob", "Smith", 45)).await?;

                let pending = repo.query("find_by_last_name_order_by_age_desc", ReturnShape::Collection, params!["Smith"]);
                let found = pending.await?.into_entities()?;
                let ids: Vec<String> = found.into_iter().map(|p| p.id).collect();
                assert_eq!(ids, vec!["2", "1"]);

                let exists = repo
                    .query("exists_by_age_greater_than", ReturnShape::Single, params![40])
                    .await?
                    .into_exists()?;
                assert!(exists);

                let invalid = repo
                    .query("find_by_nickname", ReturnShape::Collection, params!["x"])
                    .await;
                assert!(invalid.is_err());
                Ok::<(), CosmosError>(())
            })
        },
        cleanup,
    )
}
