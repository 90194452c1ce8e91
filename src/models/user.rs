use diesel::prelude::*;
use diesel::SqliteConnection;
use serde_derive::{Deserialize, Serialize};

use crate::schema::users;

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub name: String,
    pub office: String,
    pub designation: String,
}

#[derive(Insertable, Deserialize, Serialize, Debug, Clone)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub name: String,
    pub office: String,
    pub designation: String,
}

impl User {
    pub fn all(conn: &mut SqliteConnection) -> QueryResult<Vec<User>> {
        users::table
            .order(users::id.asc())
            .select(User::as_select())
            .load(conn)
    }

    pub fn create(new_user: &NewUser, conn: &mut SqliteConnection) -> QueryResult<User> {
        diesel::insert_into(users::table)
            .values(new_user)
            .returning(User::as_returning())
            .get_result(conn)
    }

    /// The string encoded into this user's QR artifact.
    pub fn qr_payload(&self) -> String {
        crate::models::qr_payload::encode(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_pool;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            office: "HQ".to_string(),
            designation: "Eng".to_string(),
        }
    }

    #[test]
    fn test_ids_strictly_increase() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        let ada = User::create(&new_user("Ada"), &mut conn).unwrap();
        let grace = User::create(&new_user("Grace"), &mut conn).unwrap();
        let alan = User::create(&new_user("Alan"), &mut conn).unwrap();

        assert_eq!(ada.id, 1);
        assert!(ada.id < grace.id && grace.id < alan.id);
        assert_eq!(User::all(&mut conn).unwrap(), vec![ada, grace, alan]);
    }
}
