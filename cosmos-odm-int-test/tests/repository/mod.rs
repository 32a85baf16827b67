mod derived_query_test;
mod reactive_repository_test;
mod repository_factory_test;
mod simple_repository_test;
