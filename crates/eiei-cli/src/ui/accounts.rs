//! Rendering for users and roles.

use console::style;
use eiei_gateway::{PublicUser, User, auth::Role};

const ID_WIDTH: usize = 38;
const EMAIL_WIDTH: usize = 32;
const ROLE_WIDTH: usize = 12;

fn user_row(user: &PublicUser) -> String {
    format!(
        "{:<ID_WIDTH$} {:<EMAIL_WIDTH$} {:<ROLE_WIDTH$}",
        user.id.as_str(),
        user.email,
        user.role
    )
}

/// Print one page of users as a table.
///
/// `skip` is the offset of the first row, used for the range line.
pub fn user_table(users: &[PublicUser], skip: usize) {
    if users.is_empty() {
        super::info("No users found.");
        return;
    }

    super::info(&format!("Users {}-{}:", skip + 1, skip + users.len()));
    println!();
    println!(
        "{}",
        style(format!(
            "{:<ID_WIDTH$} {:<EMAIL_WIDTH$} {:<ROLE_WIDTH$}",
            "ID", "EMAIL", "ROLE"
        ))
        .bold()
    );
    println!("{}", "-".repeat(ID_WIDTH + EMAIL_WIDTH + ROLE_WIDTH));

    for user in users {
        println!("{}", user_row(user));
    }
}

/// Print the full stored record of one user, minus credentials.
pub fn user_details(user: &User) {
    super::header(&format!("{} {}", user.first_name, user.last_name));
    super::kv("ID", user.id.as_str());
    super::kv("Email", &user.email);
    super::kv("Phone", &user.phone_number);
    super::kv("Role", &style(&user.role).cyan().to_string());
    super::kv("Created", &user.created_at.to_rfc3339());
    super::kv("Updated", &user.updated_at.to_rfc3339());
}

/// Print the role list, or a hint when nothing is seeded.
pub fn role_list(roles: &[Role]) {
    if roles.is_empty() {
        super::info("No roles. Run 'eiei roles seed' first.");
        return;
    }
    for role in roles {
        super::kv(
            &role.name,
            &role.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_row_pads_columns() {
        let user = PublicUser {
            id: eiei_core::UserId::new("u1"),
            email: "a@x.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            phone_number: "+2348012345678".to_string(),
            role: "vendor".to_string(),
        };

        let row = user_row(&user);
        assert!(row.starts_with("u1 "));
        assert_eq!(row.find("a@x.com"), Some(ID_WIDTH + 1));
        assert_eq!(row.find("vendor"), Some(ID_WIDTH + EMAIL_WIDTH + 2));
    }
}
