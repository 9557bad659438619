mod sharing_tests;

use crate::models::{User, UserName};
use crate::store::Store;
use chrono::Utc;
use uuid::Uuid;

// Every test gets its own scratch storage root
pub fn test_store() -> Store {
    let dir = std::env::temp_dir().join(format!("quill-test-{}", Uuid::new_v4()));
    Store::open(&dir).expect("failed to open test store")
}

pub fn make_user(store: &Store, username: &str) -> User {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        // Not a real hash; unit tests never log in through the API
        password_hash: "unused".to_string(),
        name: UserName {
            first_name: username.to_string(),
            middle_name: String::new(),
            last_name: String::new(),
        },
        avatar: None,
        bio: None,
        teams: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    store.save_user(&user).expect("save user");
    user
}
