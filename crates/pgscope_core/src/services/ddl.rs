//! Reverse-engineered DDL fragments for catalog objects: comments,
//! ownership and privileges.

use crate::services::session::Session;
use crate::sql::{quote_ident, quote_literal, QueryTokenizer};

/// Privilege letters of an ACL item, in the order they are granted.
const PRIVILEGES: &[(char, &str)] = &[
    ('r', "SELECT"),
    ('w', "UPDATE"),
    ('a', "INSERT"),
    ('d', "DELETE"),
    ('R', "RULE"),
    ('x', "REFERENCES"),
    ('t', "TRIGGER"),
    ('X', "EXECUTE"),
    ('U', "USAGE"),
    ('C', "CREATE"),
    ('T', "TEMPORARY"),
];

/// `TYPE identifier`, the object clause shared by COMMENT, ALTER and GRANT.
pub fn object_clause(type_name: &str, qualified_ident: &str) -> String {
    format!("{} {}", type_name.to_uppercase(), qualified_ident)
}

/// `COMMENT ON` statement, or nothing when the object has no comment.
pub fn comment_sql(type_name: &str, qualified_ident: &str, comment: Option<&str>) -> String {
    match comment {
        Some(comment) => format!(
            "COMMENT ON {} IS {};\n",
            object_clause(type_name, qualified_ident),
            quote_literal(comment)
        ),
        None => String::new(),
    }
}

/// `ALTER ... OWNER TO` statement for an object clause.
pub fn owner_sql(object: &str, owner: &str) -> String {
    format!("ALTER {} OWNER TO {};\n", object, quote_ident(owner))
}

/// [`owner_sql`] when the server is at least `major.minor`, otherwise empty.
pub fn owner_sql_if_supported(
    session: &mut Session,
    major: u32,
    minor: u32,
    object: &str,
    owner: &str,
) -> String {
    if session.backend_minimum_version(major, minor) {
        owner_sql(object, owner)
    } else {
        String::new()
    }
}

/// GRANT/REVOKE statements reproducing an ACL array such as
/// `{=r/postgres,alice=arw*/postgres,"group staff=r/postgres"}`.
///
/// `all_pattern` lists the letters that make up `ALL` for the object kind
/// (e.g. `arwdRxt` for tables); letters outside it are ignored.
pub fn grant_sql(all_pattern: &str, acl: Option<&str>, grant_for: &str) -> String {
    let Some(acl) = acl else {
        return String::new();
    };
    let inner = acl
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(acl);

    let mut grant = String::new();
    for item in QueryTokenizer::with_delimiter(inner, ',') {
        let item = match item.strip_prefix('"') {
            Some(rest) => rest.get(..rest.len().saturating_sub(1)).unwrap_or_default(),
            None => item,
        };
        let (user, privileges) = item.split_once('=').unwrap_or((item, ""));
        let privileges = privileges.split('/').next().unwrap_or_default();

        let grantee = if user.is_empty() {
            "public".to_string()
        } else if let Some(group) = user.strip_prefix("group ") {
            format!("GROUP {}", quote_ident(group))
        } else {
            quote_ident(user)
        };

        grant.push_str(&privilege_statements(all_pattern, privileges, grant_for, &grantee));
    }
    grant
}

/// Split one grantee's privileges by grant option and emit a statement
/// for each group.
fn privilege_statements(
    all_pattern: &str,
    privileges: &str,
    grant_for: &str,
    grantee: &str,
) -> String {
    let mut with_grant = String::new();
    let mut without_grant = String::new();

    let mut chars = privileges.chars().peekable();
    while let Some(c) = chars.next() {
        let grantable = chars.next_if_eq(&'*').is_some();
        if all_pattern.contains(c) {
            if grantable {
                with_grant.push(c);
            } else {
                without_grant.push(c);
            }
        }
    }

    let mut sql = String::new();
    if !without_grant.is_empty() || with_grant.is_empty() {
        sql.push_str(&privilege_statement(all_pattern, &without_grant, grant_for, grantee));
        sql.push_str(";\n");
    }
    if !with_grant.is_empty() {
        sql.push_str(&privilege_statement(all_pattern, &with_grant, grant_for, grantee));
        sql.push_str(" WITH GRANT OPTION;\n");
    }
    sql
}

fn privilege_statement(all_pattern: &str, letters: &str, grant_for: &str, grantee: &str) -> String {
    let rights = if all_pattern.len() > 1 && letters == all_pattern {
        "ALL".to_string()
    } else {
        PRIVILEGES
            .iter()
            .filter(|(letter, _)| letters.contains(*letter))
            .map(|(_, name)| *name)
            .collect::<Vec<_>>()
            .join(", ")
    };

    if rights.is_empty() {
        format!("REVOKE ALL ON {grant_for} FROM {grantee}")
    } else {
        format!("GRANT {rights} ON {grant_for} TO {grantee}")
    }
}
