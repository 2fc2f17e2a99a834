//! When steps for topic deletion BDD scenarios.

use super::world::{TopicDeletionWorld, run_async};
use rstest_bdd_macros::when;

#[when("the topic is deleted")]
fn topic_is_deleted(world: &mut TopicDeletionWorld) -> Result<(), eyre::Report> {
    let topic_id = world.topic()?.id();
    let result = run_async(world.topics.delete_topic(&world.isolation, topic_id));
    world.deletion_result = Some(result);
    Ok(())
}
