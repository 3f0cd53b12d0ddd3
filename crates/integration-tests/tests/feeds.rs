//! Feed fan-out end to end: followers see new posts at the head of their
//! feeds, strangers see nothing.

use integration_tests::TestEnv;

#[tokio::test]
async fn follower_feed_grows_by_one_with_the_new_post_at_its_head() {
    let env = TestEnv::new();
    let alice = env.create_user("alice").await;
    let bob = env.create_user("bob").await;
    env.follow(bob, alice).await;

    let first = env.posts.create_post(alice, "one").await.unwrap();
    let before = env.feed(bob).await.len();

    let second = env.posts.create_post(alice, "two").await.unwrap();

    let feed = env.feed(bob).await;
    assert_eq!(feed.len(), before + 1);
    assert_eq!(feed[0], second.to_string());
    assert_eq!(feed[1], first.to_string());
}

#[tokio::test]
async fn author_sees_their_own_post_in_their_feed() {
    let env = TestEnv::new();
    let alice = env.create_user("alice").await;

    let pid = env.posts.create_post(alice, "hello").await.unwrap();
    assert_eq!(env.feed(alice).await, vec![pid.to_string()]);
}

#[tokio::test]
async fn non_followers_are_unaffected() {
    let env = TestEnv::new();
    let alice = env.create_user("alice").await;
    let bob = env.create_user("bob").await;
    let stranger = env.create_user("carol").await;
    env.follow(bob, alice).await;

    env.posts.create_post(alice, "hello").await.unwrap();

    assert_eq!(env.feed(bob).await.len(), 1);
    assert!(env.feed(stranger).await.is_empty());
}

#[tokio::test]
async fn every_follower_receives_the_fan_out() {
    let env = TestEnv::new();
    let alice = env.create_user("alice").await;
    let mut followers = Vec::new();
    for name in ["bob", "carol", "dave", "erin"] {
        let uid = env.create_user(name).await;
        env.follow(uid, alice).await;
        followers.push(uid);
    }

    let pid = env.posts.create_post(alice, "to everyone").await.unwrap();

    for follower in followers {
        assert_eq!(env.feed(follower).await, vec![pid.to_string()]);
    }
}
