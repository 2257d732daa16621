mod fixtures;
mod movement_tests;
mod query_tests;
mod world_tests;
