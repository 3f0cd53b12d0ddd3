//! Subscription semantics through the full engine: first reason wins,
//! unsubscribe silences future alerts.

use domains::Reason;
use integration_tests::TestEnv;
use services::subscriptions;

#[tokio::test]
async fn poster_reason_survives_later_commenting() {
    let env = TestEnv::new();
    let alice = env.create_user("alice").await;
    let pid = env.posts.create_post(alice, "mine").await.unwrap();

    // Commenting on your own post does not demote you to commenter.
    env.posts.create_comment(alice, pid, "bump").await.unwrap();

    assert_eq!(
        subscriptions::subscription_reason(env.store.as_ref(), alice, pid)
            .await
            .unwrap(),
        Some(Reason::Poster)
    );
}

#[tokio::test]
async fn tagee_reason_survives_later_commenting() {
    let env = TestEnv::new();
    let alice = env.create_user("alice").await;
    let bob = env.create_user("bob").await;

    let pid = env.posts.create_post(alice, "hello @bob").await.unwrap();
    env.posts.create_comment(bob, pid, "hi!").await.unwrap();

    assert_eq!(
        subscriptions::subscription_reason(env.store.as_ref(), bob, pid)
            .await
            .unwrap(),
        Some(Reason::Tagee)
    );
}

#[tokio::test]
async fn unsubscribed_users_stop_receiving_alerts() {
    let env = TestEnv::new();
    let alice = env.create_user("alice").await;
    let bob = env.create_user("bob").await;
    let carol = env.create_user("carol").await;

    let pid = env.posts.create_post(alice, "thread").await.unwrap();
    env.posts.create_comment(bob, pid, "watching").await.unwrap();

    assert!(
        subscriptions::unsubscribe(env.store.as_ref(), bob, pid)
            .await
            .unwrap()
    );

    env.posts.create_comment(carol, pid, "more").await.unwrap();

    // Bob heard nothing after unsubscribing.
    assert!(env.alerts.for_recipient(bob).is_empty());
    // Alice still did.
    assert_eq!(env.alerts.for_recipient(alice).len(), 2);
}

#[tokio::test]
async fn subscribing_to_a_deleted_post_fails_closed() {
    let env = TestEnv::new();
    let alice = env.create_user("alice").await;
    let bob = env.create_user("bob").await;

    let pid = env.posts.create_post(alice, "fleeting").await.unwrap();
    env.posts.delete(alice, pid, None).await.unwrap();

    let subscribed = subscriptions::subscribe(env.store.as_ref(), bob, pid, Reason::Commenter)
        .await
        .unwrap();
    assert!(!subscribed);
    assert!(
        !subscriptions::is_subscribed(env.store.as_ref(), bob, pid)
            .await
            .unwrap()
    );
}
