use cosmos_odm::client::DocumentClient;
use cosmos_odm::errors::ErrorKind;
use cosmos_odm::repository::CosmosRepository;
use cosmos_odm_int_test::fixtures::{Person, PurchaseOrder};
use cosmos_odm_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_repository_creates_container() {
    run_test(
        create_test_context,
        |ctx| {
            let client = ctx.factory().client();
            let err = client.read_container(ctx.database(), "people").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);

            let repositories = ctx.repositories();
            let repo = repositories.repository::<Person>()?;
            assert_eq!(repo.container_name(), "people");

            let properties = client.read_container(ctx.database(), "people")?;
            assert_eq!(properties.partition_key_path.as_deref(), Some("/lastName"));
            assert_eq!(properties.throughput, Some(1000));

            // second request reuses the ensured container
            repositories.repository::<Person>()?.save(&Person::new("1", "Ann", "Smith", 30))?;
            assert_eq!(repo.count()?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_destroy_repository() {
    run_test(
        create_test_context,
        |ctx| {
            let repositories = ctx.repositories();
            let orders = repositories.repository::<PurchaseOrder>()?;
            orders.save(&PurchaseOrder {
                order_no: 1,
                customer: "acme".into(),
                total: 10,
                cached_summary: None,
            })?;

            repositories.destroy_repository::<PurchaseOrder>()?;
            let client = ctx.factory().client();
            let err = client.read_container(ctx.database(), "orders").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);

            let recreated = repositories.repository::<PurchaseOrder>()?;
            assert_eq!(recreated.count()?, 0);

            let err = repositories.destroy_repository::<Person>().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_factories_share_containers() {
    run_test(
        create_test_context,
        |ctx| {
            let sync_repo = ctx.repositories().repository::<Person>()?;
            sync_repo.save(&Person::new("1", "Ann", "Smith", 30))?;

            let reactive_repo = ctx.reactive_repositories().repository::<Person>()?;
            let count = futures::executor::block_on(reactive_repo.count())?;
            assert_eq!(count, 1);

            ctx.reactive_repositories().destroy_repository::<Person>()?;
            let err = ctx
                .factory()
                .client()
                .read_container(ctx.database(), "people")
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        cleanup,
    )
}
