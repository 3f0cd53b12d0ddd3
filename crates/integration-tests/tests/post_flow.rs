//! Post creation end to end: id reservation, indexes, subscriptions and
//! tagging alerts.

use domains::ports::KvStore;
use domains::{keys, AlertKind, Reason};
use integration_tests::TestEnv;
use services::subscriptions;

#[tokio::test]
async fn posting_with_a_tag_subscribes_and_alerts_the_tagee() {
    let env = TestEnv::new();
    let alice = env.create_user("alice").await;
    let bob = env.create_user("bob").await;

    let pid = env.posts.create_post(alice, "Hello @bob").await.unwrap();

    // Author subscribed as poster, tagee as tagee.
    assert_eq!(
        subscriptions::subscription_reason(env.store.as_ref(), alice, pid)
            .await
            .unwrap(),
        Some(Reason::Poster)
    );
    assert_eq!(
        subscriptions::subscription_reason(env.store.as_ref(), bob, pid)
            .await
            .unwrap(),
        Some(Reason::Tagee)
    );

    // Exactly one recipient, exactly one alert.
    assert_eq!(env.alerts.recipients(), vec![bob]);
    let inbox = env.alerts.for_recipient(bob);
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, AlertKind::Tagging);
    assert_eq!(inbox[0].message, "alice tagged you in a post.");
    assert_eq!(inbox[0].pid, pid);

    let view = env.posts.get_post(pid).await.unwrap().expect("post exists");
    assert_eq!(view.score, 0);
    assert_eq!(view.body, "Hello @bob");
    assert_eq!(view.user_username, "alice");
}

#[tokio::test]
async fn tagging_yourself_does_nothing() {
    let env = TestEnv::new();
    let alice = env.create_user("alice").await;

    let pid = env.posts.create_post(alice, "note to @alice").await.unwrap();

    assert!(env.alerts.recipients().is_empty());
    // Still subscribed as poster, not tagee.
    assert_eq!(
        subscriptions::subscription_reason(env.store.as_ref(), alice, pid)
            .await
            .unwrap(),
        Some(Reason::Poster)
    );
}

#[tokio::test]
async fn duplicate_tags_alert_once() {
    let env = TestEnv::new();
    let alice = env.create_user("alice").await;
    let bob = env.create_user("bob").await;
    let carol = env.create_user("carol").await;

    env.posts
        .create_post(alice, "hi @bob @bob @carol")
        .await
        .unwrap();

    assert_eq!(env.alerts.for_recipient(bob).len(), 1);
    assert_eq!(env.alerts.for_recipient(carol).len(), 1);
}

#[tokio::test]
async fn post_ids_increase_monotonically() {
    let env = TestEnv::new();
    let alice = env.create_user("alice").await;

    let first = env.posts.create_post(alice, "one").await.unwrap();
    let second = env.posts.create_post(alice, "two").await.unwrap();
    assert!(second > first);

    // Both pids sit newest-first in the author's post index.
    let index = env
        .store
        .list_range(&keys::user_posts(alice), 0, -1)
        .await
        .unwrap();
    assert_eq!(index, vec![second.to_string(), first.to_string()]);
}
