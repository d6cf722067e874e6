//! Dependency discovery over `pg_depend`.
//!
//! Both directions run one catalog query that joins the dependency edge to
//! every catalog an endpoint can live in, derives a one or two character
//! discriminator for the endpoint, and restricts the edge to the catalogs
//! the browser knows how to show.

use crate::models::{
    BrowserSettings, DependencyClass, DependencyRow, Discriminator, ObjectKind, ResultSet,
};
use crate::services::session::Session;

/// Catalogs an edge endpoint must belong to.
const CATALOGS: &[&str] = &[
    "pg_class",
    "pg_constraint",
    "pg_conversion",
    "pg_language",
    "pg_proc",
    "pg_rewrite",
    "pg_namespace",
    "pg_trigger",
    "pg_type",
];

/// Which end of the edge the object is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Objects the given object depends on.
    DependsOn,
    /// Objects that depend on the given object.
    ReferencedBy,
}

impl Direction {
    /// Column holding the other endpoint's id.
    fn other_column(&self) -> &'static str {
        match self {
            Self::DependsOn => "refobjid",
            Self::ReferencedBy => "objid",
        }
    }

    /// Column holding the other endpoint's catalog.
    fn class_column(&self) -> &'static str {
        match self {
            Self::DependsOn => "refclassid",
            Self::ReferencedBy => "classid",
        }
    }

    /// Column matched against the given object.
    fn own_column(&self) -> &'static str {
        match self {
            Self::DependsOn => "objid",
            Self::ReferencedBy => "refobjid",
        }
    }
}

/// Build the dependency query for `oid`. A non-empty `filter` replaces the
/// generated `WHERE` clause and must start with `WHERE`.
pub fn dependency_query(direction: Direction, oid: u32, filter: Option<&str>) -> String {
    let other = direction.other_column();
    let class = direction.class_column();
    let where_clause = match filter {
        Some(filter) if !filter.trim().is_empty() => format!(" {}", filter.trim()),
        _ => format!(" WHERE dep.{}={}", direction.own_column(), oid),
    };
    let catalogs = CATALOGS.iter().map(|c| format!("'{c}'")).collect::<Vec<_>>().join(", ");

    format!(
        "SELECT DISTINCT deptype, {class}, cl.relkind,\n\
         \x20      CASE WHEN cl.relkind = 'p' THEN 'r'::text\n\
         \x20           WHEN cl.relkind = 'I' THEN 'i'::text\n\
         \x20           WHEN cl.relkind IS NOT NULL THEN cl.relkind::text\n\
         \x20           WHEN tg.oid IS NOT NULL THEN 'T'::text\n\
         \x20           WHEN ty.oid IS NOT NULL THEN 'y'::text\n\
         \x20           WHEN ns.oid IS NOT NULL THEN 'n'::text\n\
         \x20           WHEN pr.oid IS NOT NULL THEN 'p'::text\n\
         \x20           WHEN la.oid IS NOT NULL THEN 'l'::text\n\
         \x20           WHEN rw.oid IS NOT NULL THEN 'R'::text\n\
         \x20           WHEN co.oid IS NOT NULL THEN 'C'::text || contype\n\
         \x20           ELSE '' END AS type,\n\
         \x20      COALESCE(coc.relname, clrw.relname) AS ownertable,\n\
         \x20      COALESCE(cl.relname, conname, proname, tgname, typname, lanname, rulename, ns.nspname) AS refname,\n\
         \x20      COALESCE(nsc.nspname, nso.nspname, nsp.nspname, nst.nspname, nsrw.nspname) AS nspname\n\
         \x20 FROM pg_depend dep\n\
         \x20 LEFT JOIN pg_class cl ON dep.{other}=cl.oid\n\
         \x20 LEFT JOIN pg_namespace nsc ON cl.relnamespace=nsc.oid\n\
         \x20 LEFT JOIN pg_proc pr ON dep.{other}=pr.oid\n\
         \x20 LEFT JOIN pg_namespace nsp ON pronamespace=nsp.oid\n\
         \x20 LEFT JOIN pg_trigger tg ON dep.{other}=tg.oid\n\
         \x20 LEFT JOIN pg_type ty ON dep.{other}=ty.oid\n\
         \x20 LEFT JOIN pg_namespace nst ON typnamespace=nst.oid\n\
         \x20 LEFT JOIN pg_constraint co ON dep.{other}=co.oid\n\
         \x20 LEFT JOIN pg_class coc ON conrelid=coc.oid\n\
         \x20 LEFT JOIN pg_namespace nso ON connamespace=nso.oid\n\
         \x20 LEFT JOIN pg_rewrite rw ON dep.{other}=rw.oid\n\
         \x20 LEFT JOIN pg_class clrw ON clrw.oid=rw.ev_class\n\
         \x20 LEFT JOIN pg_namespace nsrw ON clrw.relnamespace=nsrw.oid\n\
         \x20 LEFT JOIN pg_language la ON dep.{other}=la.oid\n\
         \x20 LEFT JOIN pg_namespace ns ON dep.{other}=ns.oid\n\
         {where_clause}\n\
         \x20  AND {class} IN (\n\
         \x20  SELECT oid FROM pg_class\n\
         \x20   WHERE relname IN ({catalogs}))\n\
         \x20ORDER BY {class}, cl.relkind"
    )
}

/// Finds the dependency neighbourhood of catalog objects.
pub struct DependencyResolver<'a> {
    session: &'a mut Session,
    settings: &'a BrowserSettings,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(session: &'a mut Session, settings: &'a BrowserSettings) -> Self {
        Self { session, settings }
    }

    /// Objects `oid` depends on.
    pub fn find_dependencies(&mut self, oid: u32, filter: Option<&str>) -> Vec<DependencyRow> {
        self.resolve(Direction::DependsOn, oid, filter)
    }

    /// Objects that depend on `oid`.
    pub fn find_dependents(&mut self, oid: u32, filter: Option<&str>) -> Vec<DependencyRow> {
        self.resolve(Direction::ReferencedBy, oid, filter)
    }

    fn resolve(
        &mut self,
        direction: Direction,
        oid: u32,
        filter: Option<&str>,
    ) -> Vec<DependencyRow> {
        let sql = dependency_query(direction, oid, filter);
        let Some(set) = self.session.execute_set(&sql) else {
            tracing::warn!(oid, ?direction, "Dependency lookup failed");
            return Vec::new();
        };
        let rows = map_rows(set, self.settings);
        tracing::debug!(oid, ?direction, count = rows.len(), "Dependencies resolved");
        rows
    }
}

/// Turn catalog rows into display rows, applying the visibility policy.
pub fn map_rows(mut set: ResultSet, settings: &BrowserSettings) -> Vec<DependencyRow> {
    let mut rows = Vec::with_capacity(set.num_rows());

    while !set.eof() {
        if let Some(row) = map_row(&set, settings) {
            rows.push(row);
        }
        set.move_next();
    }
    rows
}

fn map_row(set: &ResultSet, settings: &BrowserSettings) -> Option<DependencyRow> {
    let kind = match ObjectKind::classify(set.value("type")) {
        Discriminator::Skip => return None,
        Discriminator::Kind(kind) => kind,
    };
    let dependency_class = DependencyClass::from_code(set.value("deptype"));
    if dependency_class == DependencyClass::Internal && !settings.show_system_objects {
        return None;
    }

    let name = set.value("refname").to_string();
    let owner = set.value("ownertable");
    let namespace = set.value("nspname");
    let prefix = settings.schema_prefix(namespace);

    let display_name = match kind {
        ObjectKind::Rule => format!("{name} ON {prefix}{owner}"),
        ObjectKind::ForeignKey => format!("{prefix}{owner}.{name}"),
        _ => format!("{prefix}{name}"),
    };
    let type_label = match dependency_class {
        DependencyClass::Pin => String::new(),
        _ => kind.display_name().to_string(),
    };

    Some(DependencyRow {
        kind,
        type_label,
        name,
        display_name,
        owner_table: non_empty(owner),
        namespace: non_empty(namespace),
        dependency_class,
    })
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
