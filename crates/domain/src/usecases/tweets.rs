//! Tweet lifecycle use case - generation, editing, posting, listing and images

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use tokio::sync::Mutex;

use crate::{
    error::TweetError,
    model::{
        GeneratedImage, GeneratedTweet, ImageFile, ImageFormat, ListQuery, NewTweet, PostOutcome,
        PostStatus, Tweet, TweetFilter, TweetPage, TweetUpdate,
    },
    policy::{self, MAX_PAGE_LIMIT},
    ports::{Clock, ImageGenerator, ImageStore, SocialPublisher, TweetStore, TweetWriter},
    usecases::pagination::{PageInfo, PageRequest},
};

const TEXT_SERVICE: &str = "Text generation";
const IMAGE_SERVICE: &str = "Image generation";

/// Configuration for the tweet service
#[derive(Debug, Clone)]
pub struct TweetServiceConfig {
    /// Largest page size accepted by `list`
    pub max_page_limit: u64,
}

impl Default for TweetServiceConfig {
    fn default() -> Self {
        Self {
            max_page_limit: MAX_PAGE_LIMIT,
        }
    }
}

/// Tweet lifecycle manager
pub struct TweetService<St, W, G, I, P, Cl>
where
    St: TweetStore + ?Sized,
    W: TweetWriter + ?Sized,
    G: ImageGenerator + ?Sized,
    I: ImageStore + ?Sized,
    P: SocialPublisher + ?Sized,
    Cl: Clock + ?Sized,
{
    store: Arc<St>,
    writer: Arc<W>,
    image_generator: Arc<G>,
    image_store: Arc<I>,
    publisher: Arc<P>,
    clock: Arc<Cl>,
    config: TweetServiceConfig,
    post_locks: PostLocks,
}

impl<St, W, G, I, P, Cl> TweetService<St, W, G, I, P, Cl>
where
    St: TweetStore + ?Sized,
    W: TweetWriter + ?Sized,
    G: ImageGenerator + ?Sized,
    I: ImageStore + ?Sized,
    P: SocialPublisher + ?Sized,
    Cl: Clock + ?Sized,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<St>,
        writer: Arc<W>,
        image_generator: Arc<G>,
        image_store: Arc<I>,
        publisher: Arc<P>,
        clock: Arc<Cl>,
        config: TweetServiceConfig,
    ) -> Self {
        Self {
            store,
            writer,
            image_generator,
            image_store,
            publisher,
            clock,
            config,
            post_locks: PostLocks::default(),
        }
    }

    /// Generate tweet text (and an image when the writer asks for one) and persist it
    pub async fn generate(&self, topic: &str) -> Result<GeneratedTweet, TweetError> {
        let topic = policy::validate_topic(topic)?;

        tracing::info!(topic = %topic, "Generating tweet");

        let content = self
            .writer
            .write_tweet(topic)
            .await
            .map_err(|e| TweetError::upstream(TEXT_SERVICE, e))?;
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(TweetError::upstream(TEXT_SERVICE, "empty tweet text"));
        }

        // The image decision is advisory; a failure means no image
        let wants_image = match self.writer.needs_image(topic).await {
            Ok(wants) => wants,
            Err(e) => {
                tracing::warn!(error = %e, "Image decision failed, continuing without image");
                false
            }
        };

        let image_path = if wants_image {
            Some(self.create_image(topic).await?)
        } else {
            None
        };

        let new_tweet = NewTweet {
            topic: topic.to_string(),
            content,
            image_path,
            created_at: self.clock.now(),
        };

        let tweet = match self.store.insert(&new_tweet).await {
            Ok(tweet) => tweet,
            Err(e) => {
                if let Some(path) = &new_tweet.image_path {
                    self.discard_image(path).await;
                }
                return Err(e.into());
            }
        };

        tracing::info!(
            tweet_id = tweet.id,
            has_image = tweet.image_path.is_some(),
            "Tweet generated"
        );

        Ok(GeneratedTweet {
            id: tweet.id,
            topic: tweet.topic,
            content: tweet.content,
            image_path: tweet.image_path,
        })
    }

    /// Fetch a single tweet
    pub async fn get(&self, id: i64) -> Result<Tweet, TweetError> {
        self.require(id).await
    }

    /// Edit topic and/or content of a tweet that has not been posted
    pub async fn edit(&self, id: i64, update: TweetUpdate) -> Result<Tweet, TweetError> {
        let mut update = update.normalized();
        if update.is_empty() {
            return Err(TweetError::InvalidArgument(
                "At least one of topic or content must be provided".to_string(),
            ));
        }
        if let Some(topic) = update.topic.take() {
            update.topic = Some(policy::validate_topic(&topic)?.to_string());
        }

        // Shares the post lock so text cannot change between publish and flip
        let lock = self.post_locks.lock_for(id);
        let _guard = lock.lock().await;

        if let Some(tweet) = self.store.update_draft(id, &update).await? {
            tracing::info!(tweet_id = id, "Tweet updated");
            return Ok(tweet);
        }

        // Nothing matched an unposted row: tell missing apart from posted
        match self.store.get(id).await? {
            None => Err(not_found(id)),
            Some(_) => Err(TweetError::InvalidState(
                "Tweet already posted and cannot be edited".to_string(),
            )),
        }
    }

    /// Publish a tweet at most once
    pub async fn post(&self, id: i64) -> Result<PostOutcome, TweetError> {
        // Held across check, publish and flip so concurrent posts of one id
        // cannot both reach the publisher and edits wait for the flip
        let lock = self.post_locks.lock_for(id);
        let _guard = lock.lock().await;

        let tweet = self.require(id).await?;
        if tweet.posted {
            tracing::info!(tweet_id = id, "Tweet already posted, skipping publish");
            return Ok(PostOutcome {
                status: PostStatus::AlreadyPosted,
                content: tweet.content,
            });
        }

        let platform = self.publisher.platform();
        let response = self
            .publisher
            .publish(&tweet.content)
            .await
            .map_err(|e| TweetError::upstream(platform, e))?;

        if !response.is_success() {
            tracing::warn!(
                tweet_id = id,
                platform = platform,
                status = response.status_code,
                "Publish rejected"
            );
            return Err(TweetError::Upstream {
                service: platform,
                status: Some(response.status_code),
                detail: format!("status {}: {}", response.status_code, response.body),
            });
        }

        if !self.store.mark_posted(id).await? {
            tracing::warn!(tweet_id = id, "Posted flag was already set");
        }

        tracing::info!(tweet_id = id, platform = platform, "Tweet posted");

        Ok(PostOutcome {
            status: PostStatus::Posted,
            content: tweet.content,
        })
    }

    /// List tweets newest first with filters and limit/offset pagination
    pub async fn list(&self, query: ListQuery) -> Result<TweetPage, TweetError> {
        let page = PageRequest::new(query.limit, query.offset, self.config.max_page_limit)?;
        let filter = TweetFilter {
            posted: query.posted,
            search: policy::validate_search(query.search.as_deref())?,
        };

        let total_items = self.store.count(&filter).await?;
        let items = self
            .store
            .list(&filter, page.limit(), page.offset())
            .await?;
        let info = PageInfo::compute(total_items, &page);

        tracing::debug!(
            total_items = info.total_items,
            returned = items.len(),
            offset = page.offset(),
            "Listed tweets"
        );

        Ok(TweetPage {
            items,
            total_items: info.total_items,
            total_pages: info.total_pages,
            current_page: info.current_page,
            limit: info.limit,
        })
    }

    /// Generate a fresh image for a tweet, replacing any previous one
    pub async fn regenerate_image(&self, id: i64) -> Result<GeneratedImage, TweetError> {
        let tweet = self.require(id).await?;

        let image_path = self.create_image(&tweet.topic).await?;

        match self.store.set_image_path(id, Some(&image_path)).await {
            Ok(true) => {}
            Ok(false) => {
                self.discard_image(&image_path).await;
                return Err(not_found(id));
            }
            Err(e) => {
                self.discard_image(&image_path).await;
                return Err(e.into());
            }
        }

        if let Some(old) = tweet.image_path.as_deref() {
            if old != image_path && self.image_store.exists(old).await {
                self.discard_image(old).await;
            }
        }

        tracing::info!(tweet_id = id, image_path = %image_path, "Image regenerated");

        Ok(GeneratedImage {
            image_path,
            tweet_id: id,
        })
    }

    /// Load the image file recorded for a tweet
    pub async fn image_file(&self, id: i64) -> Result<ImageFile, TweetError> {
        let path = self.require_image_path(id).await?;
        let bytes = self.image_store.read(&path).await?;

        Ok(ImageFile {
            format: ImageFormat::sniff(&bytes),
            path,
            bytes,
        })
    }

    /// Delete the image file of a tweet and clear its reference
    pub async fn delete_image(&self, id: i64) -> Result<(), TweetError> {
        let path = self.require_image_path(id).await?;

        // Clear the reference first so the record never points at a removed file
        self.store.set_image_path(id, None).await?;
        if let Err(e) = self.image_store.remove(&path).await {
            if let Err(restore) = self.store.set_image_path(id, Some(&path)).await {
                tracing::warn!(
                    tweet_id = id,
                    error = %restore,
                    "Failed to restore image reference"
                );
            }
            return Err(e.into());
        }

        tracing::info!(tweet_id = id, image_path = %path, "Image deleted");

        Ok(())
    }

    async fn require(&self, id: i64) -> Result<Tweet, TweetError> {
        self.store.get(id).await?.ok_or_else(|| not_found(id))
    }

    /// Recorded image path of a tweet whose file is present on disk
    async fn require_image_path(&self, id: i64) -> Result<String, TweetError> {
        let tweet = self.require(id).await?;
        let path = tweet.image_path.ok_or_else(|| {
            TweetError::NotFound(format!("No image associated with tweet {}", id))
        })?;

        if !self.image_store.exists(&path).await {
            return Err(TweetError::NotFound(format!(
                "Image file not found: {}",
                path
            )));
        }

        Ok(path)
    }

    async fn create_image(&self, topic: &str) -> Result<String, TweetError> {
        let bytes = self
            .image_generator
            .generate_image(topic)
            .await
            .map_err(|e| TweetError::upstream(IMAGE_SERVICE, e))?;

        if bytes.is_empty() {
            return Err(TweetError::upstream(IMAGE_SERVICE, "no image data returned"));
        }

        Ok(self.image_store.save(&bytes).await?)
    }

    async fn discard_image(&self, path: &str) {
        if let Err(e) = self.image_store.remove(path).await {
            tracing::warn!(image_path = %path, error = %e, "Failed to remove image file");
        }
    }
}

fn not_found(id: i64) -> TweetError {
    TweetError::NotFound(format!("Tweet {} not found", id))
}

/// Per-tweet async locks shared by post and edit, pruned when no task holds them
#[derive(Default)]
struct PostLocks {
    inner: std::sync::Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl PostLocks {
    fn lock_for(&self, id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(id).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PublishResponse;
    use crate::ports::{GenerationError, ImageStoreError, PublishError, StoreError};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use time::OffsetDateTime;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeStore {
        rows: StdMutex<Vec<Tweet>>,
        fail_insert: bool,
        fail_image_updates: AtomicBool,
    }

    #[async_trait]
    impl TweetStore for FakeStore {
        async fn insert(&self, tweet: &NewTweet) -> Result<Tweet, StoreError> {
            if self.fail_insert {
                return Err(StoreError::Database("disk full".to_string()));
            }
            let mut rows = self.rows.lock().unwrap();
            let row = Tweet {
                id: rows.len() as i64 + 1,
                topic: tweet.topic.clone(),
                content: tweet.content.clone(),
                posted: false,
                image_path: tweet.image_path.clone(),
                created_at: tweet.created_at,
            };
            rows.push(row.clone());
            Ok(row)
        }

        async fn get(&self, id: i64) -> Result<Option<Tweet>, StoreError> {
            Ok(self.rows.lock().unwrap().iter().find(|t| t.id == id).cloned())
        }

        async fn update_draft(
            &self,
            id: i64,
            update: &TweetUpdate,
        ) -> Result<Option<Tweet>, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            let Some(row) = rows.iter_mut().find(|t| t.id == id && !t.posted) else {
                return Ok(None);
            };
            if let Some(topic) = &update.topic {
                row.topic = topic.clone();
            }
            if let Some(content) = &update.content {
                row.content = content.clone();
            }
            Ok(Some(row.clone()))
        }

        async fn mark_posted(&self, id: i64) -> Result<bool, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|t| t.id == id && !t.posted) {
                Some(row) => {
                    row.posted = true;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn set_image_path(
            &self,
            id: i64,
            image_path: Option<&str>,
        ) -> Result<bool, StoreError> {
            if self.fail_image_updates.load(Ordering::SeqCst) {
                return Err(StoreError::Database("database is locked".to_string()));
            }
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|t| t.id == id) {
                Some(row) => {
                    row.image_path = image_path.map(str::to_string);
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn count(&self, filter: &TweetFilter) -> Result<u64, StoreError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().filter(|t| filter.matches(t)).count() as u64)
        }

        async fn list(
            &self,
            filter: &TweetFilter,
            limit: u64,
            offset: u64,
        ) -> Result<Vec<Tweet>, StoreError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .rev()
                .filter(|t| filter.matches(t))
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }
    }

    struct FakeWriter {
        text: String,
        needs_image: Result<bool, ()>,
        fail: bool,
    }

    impl FakeWriter {
        fn text(text: &str) -> Self {
            Self {
                text: text.to_string(),
                needs_image: Ok(false),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl TweetWriter for FakeWriter {
        async fn write_tweet(&self, _topic: &str) -> Result<String, GenerationError> {
            if self.fail {
                return Err(GenerationError::Api("quota exceeded".to_string()));
            }
            Ok(self.text.clone())
        }

        async fn needs_image(&self, _topic: &str) -> Result<bool, GenerationError> {
            self.needs_image
                .map_err(|_| GenerationError::InvalidFormat("maybe".to_string()))
        }
    }

    struct FakeImageGenerator {
        bytes: Vec<u8>,
        calls: AtomicUsize,
    }

    impl FakeImageGenerator {
        fn png() -> Self {
            Self {
                bytes: b"\x89PNG fake".to_vec(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ImageGenerator for FakeImageGenerator {
        async fn generate_image(&self, _topic: &str) -> Result<Vec<u8>, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.bytes.clone())
        }
    }

    #[derive(Default)]
    struct FakeImageStore {
        files: StdMutex<HashMap<String, Vec<u8>>>,
        counter: AtomicUsize,
        fail_remove: AtomicBool,
    }

    impl FakeImageStore {
        fn contains(&self, path: &str) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }

        fn len(&self) -> usize {
            self.files.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ImageStore for FakeImageStore {
        async fn save(&self, bytes: &[u8]) -> Result<String, ImageStoreError> {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            let path = format!("images/{}.png", n);
            self.files
                .lock()
                .unwrap()
                .insert(path.clone(), bytes.to_vec());
            Ok(path)
        }

        async fn exists(&self, path: &str) -> bool {
            self.contains(path)
        }

        async fn read(&self, path: &str) -> Result<Vec<u8>, ImageStoreError> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| ImageStoreError::NotFound(path.to_string()))
        }

        async fn remove(&self, path: &str) -> Result<(), ImageStoreError> {
            if self.fail_remove.load(Ordering::SeqCst) {
                return Err(ImageStoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "permission denied",
                )));
            }
            self.files
                .lock()
                .unwrap()
                .remove(path)
                .map(|_| ())
                .ok_or_else(|| ImageStoreError::NotFound(path.to_string()))
        }
    }

    struct FakePublisher {
        status_code: u16,
        published: StdMutex<Vec<String>>,
    }

    impl FakePublisher {
        fn with_status(status_code: u16) -> Self {
            Self {
                status_code,
                published: StdMutex::new(vec![]),
            }
        }

        fn count(&self) -> usize {
            self.published.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SocialPublisher for FakePublisher {
        async fn publish(&self, text: &str) -> Result<PublishResponse, PublishError> {
            self.published.lock().unwrap().push(text.to_string());
            Ok(PublishResponse {
                status_code: self.status_code,
                body: "remote says no".to_string(),
            })
        }

        fn platform(&self) -> &'static str {
            "twitter_clone"
        }
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> OffsetDateTime {
            OffsetDateTime::UNIX_EPOCH
        }
    }

    type TestService = TweetService<
        FakeStore,
        FakeWriter,
        FakeImageGenerator,
        FakeImageStore,
        FakePublisher,
        FixedClock,
    >;

    struct Harness {
        service: TestService,
        store: Arc<FakeStore>,
        images: Arc<FakeImageStore>,
        generator: Arc<FakeImageGenerator>,
        publisher: Arc<FakePublisher>,
    }

    fn harness_with(store: FakeStore, writer: FakeWriter, publish_status: u16) -> Harness {
        let store = Arc::new(store);
        let images = Arc::new(FakeImageStore::default());
        let generator = Arc::new(FakeImageGenerator::png());
        let publisher = Arc::new(FakePublisher::with_status(publish_status));
        let service = TweetService::new(
            Arc::clone(&store),
            Arc::new(writer),
            Arc::clone(&generator),
            Arc::clone(&images),
            Arc::clone(&publisher),
            Arc::new(FixedClock),
            TweetServiceConfig::default(),
        );
        Harness {
            service,
            store,
            images,
            generator,
            publisher,
        }
    }

    fn harness(text: &str) -> Harness {
        harness_with(FakeStore::default(), FakeWriter::text(text), 200)
    }

    #[tokio::test]
    async fn test_generate_persists_draft_without_image() {
        let h = harness("Exciting launch! #launch");

        let generated = h.service.generate("launch day").await.unwrap();

        assert_eq!(generated.id, 1);
        assert_eq!(generated.topic, "launch day");
        assert_eq!(generated.content, "Exciting launch! #launch");
        assert_eq!(generated.image_path, None);

        let stored = h.service.get(1).await.unwrap();
        assert_eq!(stored.topic, "launch day");
        assert!(!stored.posted);
        assert_eq!(stored.image_path, None);
    }

    #[tokio::test]
    async fn test_generate_ids_increase() {
        let h = harness("text");
        let first = h.service.generate("one").await.unwrap();
        let second = h.service.generate("two").await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_generate_rejects_bad_topics_without_writing() {
        let h = harness("text");

        for topic in ["", "   ", &"x".repeat(101)] {
            let result = h.service.generate(topic).await;
            assert!(matches!(result, Err(TweetError::InvalidArgument(_))));
        }
        assert_eq!(h.store.rows.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_generate_upstream_failure_creates_nothing() {
        let writer = FakeWriter {
            fail: true,
            ..FakeWriter::text("unused")
        };
        let h = harness_with(FakeStore::default(), writer, 200);

        let result = h.service.generate("topic").await;

        assert!(matches!(result, Err(TweetError::Upstream { .. })));
        assert_eq!(h.store.rows.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_generate_with_image() {
        let writer = FakeWriter {
            needs_image: Ok(true),
            ..FakeWriter::text("Look at this")
        };
        let h = harness_with(FakeStore::default(), writer, 200);

        let generated = h.service.generate("sunset").await.unwrap();

        let path = generated.image_path.expect("image recorded");
        assert!(h.images.contains(&path));
    }

    #[tokio::test]
    async fn test_generate_image_decision_failure_degrades_to_no_image() {
        let writer = FakeWriter {
            needs_image: Err(()),
            ..FakeWriter::text("text")
        };
        let h = harness_with(FakeStore::default(), writer, 200);

        let generated = h.service.generate("topic").await.unwrap();

        assert_eq!(generated.image_path, None);
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_insert_failure_removes_saved_image() {
        let writer = FakeWriter {
            needs_image: Ok(true),
            ..FakeWriter::text("text")
        };
        let store = FakeStore {
            fail_insert: true,
            ..Default::default()
        };
        let h = harness_with(store, writer, 200);

        let result = h.service.generate("topic").await;

        assert!(matches!(result, Err(TweetError::Storage(_))));
        assert_eq!(h.images.len(), 0);
    }

    #[tokio::test]
    async fn test_post_twice_publishes_once() {
        let h = harness("Exciting launch! #launch");
        h.service.generate("launch day").await.unwrap();

        let first = h.service.post(1).await.unwrap();
        assert_eq!(first.status, PostStatus::Posted);
        assert_eq!(first.content, "Exciting launch! #launch");

        let second = h.service.post(1).await.unwrap();
        assert_eq!(second.status, PostStatus::AlreadyPosted);
        assert_eq!(second.content, "Exciting launch! #launch");

        assert_eq!(h.publisher.count(), 1);
        assert!(h.service.get(1).await.unwrap().posted);
    }

    #[tokio::test]
    async fn test_concurrent_posts_publish_once() {
        let h = Arc::new(harness("text"));
        h.service.generate("topic").await.unwrap();

        let a = {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.service.post(1).await.unwrap().status })
        };
        let b = {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.service.post(1).await.unwrap().status })
        };

        let mut statuses = vec![a.await.unwrap(), b.await.unwrap()];
        statuses.sort_by_key(|s| *s == PostStatus::AlreadyPosted);

        assert_eq!(statuses, vec![PostStatus::Posted, PostStatus::AlreadyPosted]);
        assert_eq!(h.publisher.count(), 1);
    }

    #[tokio::test]
    async fn test_post_rejected_leaves_tweet_postable() {
        let h = harness_with(FakeStore::default(), FakeWriter::text("text"), 503);
        h.service.generate("topic").await.unwrap();

        let result = h.service.post(1).await;

        match result {
            Err(TweetError::Upstream { status, detail, .. }) => {
                assert_eq!(status, Some(503));
                assert!(detail.contains("remote says no"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!h.service.get(1).await.unwrap().posted);

        // A retry attempts to publish again
        let _ = h.service.post(1).await;
        assert_eq!(h.publisher.count(), 2);
    }

    #[tokio::test]
    async fn test_post_missing_tweet() {
        let h = harness("text");
        assert!(matches!(
            h.service.post(42).await,
            Err(TweetError::NotFound(_))
        ));
        assert_eq!(h.publisher.count(), 0);
    }

    #[tokio::test]
    async fn test_edit_applies_only_provided_fields() {
        let h = harness("original");
        h.service.generate("topic").await.unwrap();

        let updated = h
            .service
            .edit(
                1,
                TweetUpdate {
                    topic: None,
                    content: Some("rewritten".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.topic, "topic");
        assert_eq!(updated.content, "rewritten");
    }

    #[tokio::test]
    async fn test_edit_requires_a_field() {
        let h = harness("original");
        h.service.generate("topic").await.unwrap();

        let result = h
            .service
            .edit(
                1,
                TweetUpdate {
                    topic: Some(String::new()),
                    content: None,
                },
            )
            .await;

        assert!(matches!(result, Err(TweetError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_edit_missing_tweet() {
        let h = harness("original");
        let result = h
            .service
            .edit(
                9,
                TweetUpdate {
                    topic: Some("x".to_string()),
                    content: None,
                },
            )
            .await;
        assert!(matches!(result, Err(TweetError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_launch_day_scenario() {
        let h = harness("Exciting launch! #launch");

        let generated = h.service.generate("launch day").await.unwrap();
        assert_eq!(generated.id, 1);

        let posted = h.service.post(1).await.unwrap();
        assert_eq!(posted.status, PostStatus::Posted);

        let edit = h
            .service
            .edit(
                1,
                TweetUpdate {
                    topic: None,
                    content: Some("new".to_string()),
                },
            )
            .await;
        assert!(matches!(edit, Err(TweetError::InvalidState(_))));
        assert_eq!(
            h.service.get(1).await.unwrap().content,
            "Exciting launch! #launch"
        );

        let page = h
            .service
            .list(ListQuery {
                posted: Some(true),
                search: Some("launch".to_string()),
                limit: 5,
                offset: 0,
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_items, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
    }

    #[tokio::test]
    async fn test_list_orders_newest_first_and_paginates() {
        let h = harness("text");
        for i in 0..12 {
            h.service.generate(&format!("topic {}", i)).await.unwrap();
        }

        let page = h
            .service
            .list(ListQuery {
                limit: 5,
                offset: 5,
                ..Default::default()
            })
            .await
            .unwrap();

        let ids: Vec<i64> = page.items.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
        assert_eq!(page.total_items, 12);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 2);
    }

    #[tokio::test]
    async fn test_list_zero_limit_matches_default() {
        let h = harness("text");
        for i in 0..15 {
            h.service.generate(&format!("topic {}", i)).await.unwrap();
        }

        let zero = h
            .service
            .list(ListQuery {
                limit: 0,
                ..Default::default()
            })
            .await
            .unwrap();
        let ten = h
            .service
            .list(ListQuery {
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(zero.items, ten.items);
        assert_eq!(zero.limit, 10);
        assert_eq!(zero.total_pages, ten.total_pages);
    }

    #[tokio::test]
    async fn test_list_empty_has_one_page() {
        let h = harness("text");
        let page = h.service.list(ListQuery::default()).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_input() {
        let h = harness("text");

        let negative = h
            .service
            .list(ListQuery {
                offset: -1,
                ..Default::default()
            })
            .await;
        assert!(matches!(negative, Err(TweetError::InvalidArgument(_))));

        let long_search = h
            .service
            .list(ListQuery {
                search: Some("s".repeat(101)),
                ..Default::default()
            })
            .await;
        assert!(matches!(long_search, Err(TweetError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_regenerate_image_replaces_existing_file() {
        let writer = FakeWriter {
            needs_image: Ok(true),
            ..FakeWriter::text("text")
        };
        let h = harness_with(FakeStore::default(), writer, 200);
        let old = h.service.generate("topic").await.unwrap().image_path.unwrap();

        let fresh = h.service.regenerate_image(1).await.unwrap();

        assert_ne!(fresh.image_path, old);
        assert!(!h.images.contains(&old));
        assert!(h.images.contains(&fresh.image_path));
        assert_eq!(
            h.service.get(1).await.unwrap().image_path,
            Some(fresh.image_path)
        );
    }

    #[tokio::test]
    async fn test_regenerate_image_without_previous_image() {
        let h = harness("text");
        h.service.generate("topic").await.unwrap();

        let fresh = h.service.regenerate_image(1).await.unwrap();

        assert_eq!(fresh.tweet_id, 1);
        assert!(h.images.contains(&fresh.image_path));
    }

    #[tokio::test]
    async fn test_regenerate_image_when_recorded_file_missing() {
        let h = harness("text");
        h.service.generate("topic").await.unwrap();
        h.store
            .set_image_path(1, Some("images/gone.png"))
            .await
            .unwrap();

        let fresh = h.service.regenerate_image(1).await.unwrap();

        assert_ne!(fresh.image_path, "images/gone.png");
        assert_eq!(h.images.len(), 1);
    }

    #[tokio::test]
    async fn test_regenerate_image_empty_bytes_is_upstream_error() {
        let store = Arc::new(FakeStore::default());
        let service = TweetService::new(
            Arc::clone(&store),
            Arc::new(FakeWriter::text("text")),
            Arc::new(FakeImageGenerator {
                bytes: vec![],
                calls: AtomicUsize::new(0),
            }),
            Arc::new(FakeImageStore::default()),
            Arc::new(FakePublisher::with_status(200)),
            Arc::new(FixedClock),
            TweetServiceConfig::default(),
        );
        service.generate("topic").await.unwrap();

        let result = service.regenerate_image(1).await;

        assert!(matches!(result, Err(TweetError::Upstream { .. })));
        assert_eq!(store.get(1).await.unwrap().unwrap().image_path, None);
    }

    #[tokio::test]
    async fn test_image_file_and_delete() {
        let writer = FakeWriter {
            needs_image: Ok(true),
            ..FakeWriter::text("text")
        };
        let h = harness_with(FakeStore::default(), writer, 200);
        let path = h.service.generate("topic").await.unwrap().image_path.unwrap();

        let file = h.service.image_file(1).await.unwrap();
        assert_eq!(file.path, path);
        assert_eq!(file.format, ImageFormat::Png);

        h.service.delete_image(1).await.unwrap();
        assert!(!h.images.contains(&path));
        assert_eq!(h.service.get(1).await.unwrap().image_path, None);

        // Second delete has nothing to remove
        assert!(matches!(
            h.service.delete_image(1).await,
            Err(TweetError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_image_with_missing_file_keeps_reference() {
        let h = harness("text");
        h.service.generate("topic").await.unwrap();
        h.store
            .set_image_path(1, Some("images/gone.png"))
            .await
            .unwrap();

        let result = h.service.delete_image(1).await;

        assert!(matches!(result, Err(TweetError::NotFound(_))));
        assert_eq!(
            h.service.get(1).await.unwrap().image_path.as_deref(),
            Some("images/gone.png")
        );
    }

    #[tokio::test]
    async fn test_delete_image_store_failure_keeps_file() {
        let writer = FakeWriter {
            needs_image: Ok(true),
            ..FakeWriter::text("text")
        };
        let h = harness_with(FakeStore::default(), writer, 200);
        let path = h.service.generate("topic").await.unwrap().image_path.unwrap();
        h.store.fail_image_updates.store(true, Ordering::SeqCst);

        let result = h.service.delete_image(1).await;

        assert!(matches!(result, Err(TweetError::Storage(_))));
        assert!(h.images.contains(&path));
        assert_eq!(h.service.get(1).await.unwrap().image_path, Some(path));
    }

    #[tokio::test]
    async fn test_delete_image_remove_failure_restores_reference() {
        let writer = FakeWriter {
            needs_image: Ok(true),
            ..FakeWriter::text("text")
        };
        let h = harness_with(FakeStore::default(), writer, 200);
        let path = h.service.generate("topic").await.unwrap().image_path.unwrap();
        h.images.fail_remove.store(true, Ordering::SeqCst);

        let result = h.service.delete_image(1).await;

        assert!(result.is_err());
        assert!(h.images.contains(&path));
        assert_eq!(h.service.get(1).await.unwrap().image_path, Some(path));
    }

    /// Publisher that parks inside `publish` until released
    #[derive(Default)]
    struct GatedPublisher {
        entered: Notify,
        release: Notify,
        published: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl SocialPublisher for GatedPublisher {
        async fn publish(&self, text: &str) -> Result<PublishResponse, PublishError> {
            self.published.lock().unwrap().push(text.to_string());
            self.entered.notify_one();
            self.release.notified().await;
            Ok(PublishResponse {
                status_code: 200,
                body: String::new(),
            })
        }

        fn platform(&self) -> &'static str {
            "twitter_clone"
        }
    }

    #[tokio::test]
    async fn test_edit_waits_for_in_flight_post() {
        let store = Arc::new(FakeStore::default());
        let publisher = Arc::new(GatedPublisher::default());
        let service = Arc::new(TweetService::new(
            Arc::clone(&store),
            Arc::new(FakeWriter::text("original")),
            Arc::new(FakeImageGenerator::png()),
            Arc::new(FakeImageStore::default()),
            Arc::clone(&publisher),
            Arc::new(FixedClock),
            TweetServiceConfig::default(),
        ));
        service.generate("topic").await.unwrap();

        let post = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.post(1).await })
        };
        publisher.entered.notified().await;

        let edit = {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .edit(
                        1,
                        TweetUpdate {
                            topic: None,
                            content: Some("edited mid-publish".to_string()),
                        },
                    )
                    .await
            })
        };

        // The edit cannot complete while the publish is parked
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!edit.is_finished());
        assert_eq!(store.get(1).await.unwrap().unwrap().content, "original");

        publisher.release.notify_one();

        let outcome = post.await.unwrap().unwrap();
        assert_eq!(outcome.status, PostStatus::Posted);
        assert_eq!(outcome.content, "original");

        let edited = edit.await.unwrap();
        assert!(matches!(edited, Err(TweetError::InvalidState(_))));

        let stored = store.get(1).await.unwrap().unwrap();
        assert!(stored.posted);
        assert_eq!(stored.content, "original");
        assert_eq!(*publisher.published.lock().unwrap(), vec!["original"]);
    }

    #[tokio::test]
    async fn test_post_locks_are_pruned() {
        let locks = PostLocks::default();
        let held = locks.lock_for(1);
        drop(locks.lock_for(2));
        let _ = locks.lock_for(3);

        let map = locks.inner.lock().unwrap();
        assert!(map.contains_key(&1));
        assert!(!map.contains_key(&2));
        drop(held);
    }
}
