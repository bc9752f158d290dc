//! In-test fakes for the ports.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{ObjectKey, Post, Profile, UploadFile};
use crate::error::RepoError;
use crate::ports::{
    BaseRepository, Job, JobHandler, JobQueue, JobQueueError, ObjectStore, PostRepository,
    ProfileRepository, QueueStats, StorageError, StoredObject,
};

#[derive(Default)]
pub struct FakePostRepository {
    posts: Mutex<Vec<Post>>,
    reads_fail: AtomicBool,
    writes_fail: AtomicBool,
}

impl FakePostRepository {
    pub fn insert(&self, post: Post) {
        let mut posts = self.posts.lock().unwrap();
        posts.retain(|p| p.id != post.id);
        posts.push(post);
    }

    pub fn get(&self, id: Uuid) -> Option<Post> {
        self.posts.lock().unwrap().iter().find(|p| p.id == id).cloned()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.reads_fail.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.writes_fail.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<(), RepoError> {
        if self.reads_fail.load(Ordering::SeqCst) {
            return Err(RepoError::Connection("record store offline".to_string()));
        }
        Ok(())
    }

    fn newest_first(&self, keep: impl Fn(&Post) -> bool) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| keep(p))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for FakePostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        self.check_read()?;
        Ok(self.get(id))
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        if self.writes_fail.load(Ordering::SeqCst) {
            return Err(RepoError::Query("write rejected".to_string()));
        }
        self.insert(post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for FakePostRepository {
    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError> {
        self.check_read()?;
        Ok(self.newest_first(|p| p.author_id == author_id))
    }

    async fn find_published(&self) -> Result<Vec<Post>, RepoError> {
        self.check_read()?;
        Ok(self.newest_first(|p| p.published))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Vec<Post>, RepoError> {
        self.check_read()?;
        Ok(self.newest_first(|p| p.slug == slug))
    }
}

#[derive(Default)]
pub struct FakeProfileRepository {
    profiles: Mutex<HashMap<Uuid, Profile>>,
}

impl FakeProfileRepository {
    pub fn get(&self, id: Uuid) -> Option<Profile> {
        self.profiles.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl BaseRepository<Profile, Uuid> for FakeProfileRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, RepoError> {
        Ok(self.get(id))
    }

    async fn save(&self, profile: Profile) -> Result<Profile, RepoError> {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.profiles
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl ProfileRepository for FakeProfileRepository {
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, RepoError> {
        let profiles = self.profiles.lock().unwrap();
        Ok(ids.iter().filter_map(|id| profiles.get(id).cloned()).collect())
    }
}

#[derive(Default)]
pub struct FakeObjectStore {
    objects: Mutex<BTreeSet<ObjectKey>>,
    failing_deletes: Mutex<HashSet<String>>,
    leaked: Mutex<Vec<(Uuid, ObjectKey)>>,
    listing_fails: AtomicBool,
    uploads_fail: AtomicBool,
}

impl FakeObjectStore {
    pub const PUBLIC_BASE: &'static str = "https://cdn.test/storage/v1/object/public/images";

    pub fn insert(&self, key: &str) {
        let key = ObjectKey::parse(key).expect("valid test key");
        self.objects.lock().unwrap().insert(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        ObjectKey::parse(key).is_some_and(|key| self.objects.lock().unwrap().contains(&key))
    }

    pub fn keys(&self) -> Vec<ObjectKey> {
        self.objects.lock().unwrap().iter().cloned().collect()
    }

    pub fn fail_delete_of(&self, key: &str) {
        self.failing_deletes.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_listing(&self, fail: bool) {
        self.listing_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.uploads_fail.store(fail, Ordering::SeqCst);
    }

    /// Make `list(owner)` also report a key from another namespace.
    pub fn leak_into_listing(&self, owner: Uuid, key: &str) {
        let key = ObjectKey::parse(key).expect("valid test key");
        self.leaked.lock().unwrap().push((owner, key));
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn upload(&self, owner_id: Uuid, file: UploadFile) -> Result<StoredObject, StorageError> {
        if self.uploads_fail.load(Ordering::SeqCst) {
            return Err(StorageError::Upload("bucket is read-only".to_string()));
        }
        let key = ObjectKey::generate(owner_id, &file.filename, &file.content_type);
        self.objects.lock().unwrap().insert(key.clone());
        Ok(StoredObject {
            url: self.public_url(&key),
            key,
        })
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<ObjectKey>, StorageError> {
        if self.listing_fails.load(Ordering::SeqCst) {
            return Err(StorageError::List("listing timed out".to_string()));
        }
        let mut keys: Vec<ObjectKey> = self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|key| key.belongs_to(owner_id))
            .cloned()
            .collect();
        keys.extend(
            self.leaked
                .lock()
                .unwrap()
                .iter()
                .filter(|(owner, _)| *owner == owner_id)
                .map(|(_, key)| key.clone()),
        );
        Ok(keys)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StorageError> {
        if self.failing_deletes.lock().unwrap().contains(key.as_str()) {
            return Err(StorageError::Delete {
                key: key.to_string(),
                reason: "simulated failure".to_string(),
            });
        }
        if self.objects.lock().unwrap().remove(key) {
            Ok(())
        } else {
            Err(StorageError::NotFound(key.to_string()))
        }
    }

    fn public_url(&self, key: &ObjectKey) -> String {
        format!("{}/{}", Self::PUBLIC_BASE, key)
    }

    fn resolve(&self, reference: &str) -> Option<ObjectKey> {
        ObjectKey::from_reference(reference, Self::PUBLIC_BASE)
    }
}

#[derive(Default)]
pub struct FakeJobQueue {
    jobs: Mutex<Vec<Job>>,
    full: AtomicBool,
}

impl FakeJobQueue {
    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn set_full(&self, full: bool) {
        self.full.store(full, Ordering::SeqCst);
    }
}

#[async_trait]
impl JobQueue for FakeJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        if self.full.load(Ordering::SeqCst) {
            return Err(JobQueueError::QueueFull);
        }
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }

    async fn start_worker(&self, _handler: JobHandler) -> Result<(), JobQueueError> {
        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        Ok(QueueStats {
            pending: self.jobs.lock().unwrap().len(),
            ..Default::default()
        })
    }
}
