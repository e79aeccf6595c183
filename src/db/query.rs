//! Read side of the mirror
//!
//! Lists come back in serving order: launches newest first with undated
//! launches last, payloads and crew by name. Local id breaks ties.

use super::{
    CrewMember, Dragon, FlickrLinks, Launch, LaunchCore, LaunchDetail, LaunchLinks,
    LaunchLinksDetail, PatchLinks, Payload, PayloadDetail, RedditLinks, SpaceDb,
};
use crate::error::Result;

/// Case-insensitive substring filter over `columns`. Returns the WHERE
/// clause and the LIKE pattern to bind once per column, or `None` for a blank
/// term.
fn search_filter(columns: &[&str], term: Option<&str>) -> Option<(String, String)> {
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;

    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let pattern = format!("%{}%", escaped);

    let clause = columns
        .iter()
        .map(|c| format!("{} LIKE ? ESCAPE '\\'", c))
        .collect::<Vec<_>>()
        .join(" OR ");

    Some((format!(" WHERE {}", clause), pattern))
}

const LAUNCH_SEARCH_COLUMNS: &[&str] = &["name", "date_utc", "external_id"];
const PAYLOAD_SEARCH_COLUMNS: &[&str] = &["name", "payload_type", "orbit", "external_id"];
const CREW_SEARCH_COLUMNS: &[&str] = &["name", "agency", "status", "external_id"];

impl SpaceDb {
    async fn list_filtered<T>(
        &self,
        table: &str,
        order_by: &str,
        columns: &[&str],
        search: Option<&str>,
    ) -> Result<Vec<T>>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> + Send + Unpin,
    {
        let filter = search_filter(columns, search);
        let sql = format!(
            "SELECT * FROM {}{} ORDER BY {}",
            table,
            filter.as_ref().map_or("", |(clause, _)| clause.as_str()),
            order_by
        );

        let mut query = sqlx::query_as::<sqlx::Sqlite, T>(&sql);
        if let Some((_, pattern)) = &filter {
            for _ in columns {
                query = query.bind(pattern.as_str());
            }
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Launches newest first, optionally filtered by name, date or id
    pub async fn list_launches(&self, search: Option<&str>) -> Result<Vec<Launch>> {
        self.list_filtered("launches", "date_utc DESC, id", LAUNCH_SEARCH_COLUMNS, search)
            .await
    }

    /// Payloads by name, optionally filtered by name, type, orbit or id
    pub async fn list_payloads(&self, search: Option<&str>) -> Result<Vec<Payload>> {
        self.list_filtered("payloads", "name, id", PAYLOAD_SEARCH_COLUMNS, search)
            .await
    }

    /// Crew by name, optionally filtered by name, agency, status or id
    pub async fn list_crew(&self, search: Option<&str>) -> Result<Vec<CrewMember>> {
        self.list_filtered("crew_members", "name, id", CREW_SEARCH_COLUMNS, search)
            .await
    }

    pub async fn get_crew_member(&self, external_id: &str) -> Result<Option<CrewMember>> {
        let member =
            sqlx::query_as::<_, CrewMember>("SELECT * FROM crew_members WHERE external_id = ?")
                .bind(external_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(member)
    }

    pub async fn get_payload(&self, external_id: &str) -> Result<Option<Payload>> {
        let payload = sqlx::query_as::<_, Payload>("SELECT * FROM payloads WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(payload)
    }

    pub async fn get_launch(&self, external_id: &str) -> Result<Option<Launch>> {
        let launch = sqlx::query_as::<_, Launch>("SELECT * FROM launches WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(launch)
    }

    async fn get_dragon(&self, id: i64) -> Result<Option<Dragon>> {
        let dragon = sqlx::query_as::<_, Dragon>("SELECT * FROM dragons WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(dragon)
    }

    /// Payload plus its Dragon, if it has one
    pub async fn payload_detail(&self, external_id: &str) -> Result<Option<PayloadDetail>> {
        let Some(payload) = self.get_payload(external_id).await? else {
            return Ok(None);
        };

        let dragon = match payload.dragon_id {
            Some(id) => self.get_dragon(id).await?,
            None => None,
        };

        Ok(Some(PayloadDetail { payload, dragon }))
    }

    async fn get_launch_links(&self, id: i64) -> Result<Option<LaunchLinksDetail>> {
        let Some(links) = sqlx::query_as::<_, LaunchLinks>("SELECT * FROM launch_links WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let patch = match links.patch_id {
            Some(id) => {
                sqlx::query_as::<_, PatchLinks>("SELECT * FROM patch_links WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        let reddit = match links.reddit_id {
            Some(id) => {
                sqlx::query_as::<_, RedditLinks>("SELECT * FROM reddit_links WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        let flickr = match links.flickr_id {
            Some(id) => {
                sqlx::query_as::<_, FlickrLinks>("SELECT * FROM flickr_links WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        Ok(Some(LaunchLinksDetail {
            links,
            patch,
            reddit,
            flickr,
        }))
    }

    pub async fn launch_crew(&self, launch_id: i64) -> Result<Vec<CrewMember>> {
        let crew = sqlx::query_as::<_, CrewMember>(
            r#"
            SELECT c.* FROM crew_members c
            JOIN launch_crew lc ON lc.crew_id = c.id
            WHERE lc.launch_id = ?
            ORDER BY c.name, c.id
            "#,
        )
        .bind(launch_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(crew)
    }

    pub async fn launch_payloads(&self, launch_id: i64) -> Result<Vec<Payload>> {
        let payloads = sqlx::query_as::<_, Payload>(
            r#"
            SELECT p.* FROM payloads p
            JOIN launch_payloads lp ON lp.payload_id = p.id
            WHERE lp.launch_id = ?
            ORDER BY p.name, p.id
            "#,
        )
        .bind(launch_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payloads)
    }

    pub async fn launch_cores(&self, launch_id: i64) -> Result<Vec<LaunchCore>> {
        let cores = sqlx::query_as::<_, LaunchCore>(
            r#"
            SELECT c.* FROM launch_cores c
            JOIN launch_core_usages u ON u.core_id = c.id
            WHERE u.launch_id = ?
            ORDER BY c.id
            "#,
        )
        .bind(launch_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(cores)
    }

    /// Launch with links, nested links, crew, payloads and cores
    pub async fn launch_detail(&self, external_id: &str) -> Result<Option<LaunchDetail>> {
        let Some(launch) = self.get_launch(external_id).await? else {
            return Ok(None);
        };

        let links = match launch.links_id {
            Some(id) => self.get_launch_links(id).await?,
            None => None,
        };
        let crew = self.launch_crew(launch.id).await?;
        let payloads = self.launch_payloads(launch.id).await?;
        let cores = self.launch_cores(launch.id).await?;

        Ok(Some(LaunchDetail {
            launch,
            links,
            crew,
            payloads,
            cores,
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::write;
    use crate::db::SpaceDb;
    use crate::records::{CrewRecord, LaunchRecord, PayloadRecord};
    use tempfile::TempDir;

    async fn setup_test_db() -> (SpaceDb, TempDir) {
        let tmp = TempDir::new().unwrap();
        let db = SpaceDb::new(&tmp.path().join("test.db")).await.unwrap();
        (db, tmp)
    }

    fn launch(name: &str, date_utc: Option<&str>) -> LaunchRecord {
        LaunchRecord {
            name: Some(name.to_string()),
            date_utc: date_utc.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_launches_newest_first_undated_last() {
        let (db, _tmp) = setup_test_db().await;
        let mut tx = db.begin().await.unwrap();

        let rows = [
            ("l_old", launch("Old", Some("2008-09-28T23:15:00.000Z"))),
            ("l_none", launch("Undated", None)),
            ("l_new", launch("New", Some("2020-05-30T19:22:00.000Z"))),
        ];
        for (ext, record) in &rows {
            let links = write::create_launch_links(&mut tx, &Default::default(), None, None, None)
                .await
                .unwrap();
            write::upsert_launch(&mut tx, ext, record, links).await.unwrap();
        }
        tx.commit().await.unwrap();

        let names: Vec<String> = db
            .list_launches(None)
            .await
            .unwrap()
            .iter()
            .map(|l| l.to_string())
            .collect();
        assert_eq!(names, vec!["New", "Old", "Undated"]);
    }

    #[tokio::test]
    async fn test_payloads_by_name_nulls_first() {
        let (db, _tmp) = setup_test_db().await;
        let mut tx = db.begin().await.unwrap();

        for (ext, name) in [("p1", Some("Zeta")), ("p2", None), ("p3", Some("Alpha"))] {
            let record = PayloadRecord {
                name: name.map(str::to_string),
                ..Default::default()
            };
            write::upsert_payload(&mut tx, ext, &record, None)
                .await
                .unwrap();
        }
        tx.commit().await.unwrap();

        let ids: Vec<String> = db
            .list_payloads(None)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.external_id)
            .collect();
        assert_eq!(ids, vec!["p2", "p3", "p1"]);
    }

    async fn insert_crew(db: &SpaceDb, rows: &[(&str, Option<&str>, Option<&str>)]) {
        let mut tx = db.begin().await.unwrap();
        for (ext, name, agency) in rows {
            let record = CrewRecord {
                name: name.map(str::to_string),
                agency: agency.map(str::to_string),
                ..Default::default()
            };
            write::find_or_create_crew(&mut tx, ext, &record)
                .await
                .unwrap();
        }
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_crew_by_name_nulls_first() {
        let (db, _tmp) = setup_test_db().await;
        insert_crew(
            &db,
            &[("c1", Some("Zeta"), None), ("c2", None, None), ("c3", Some("Alpha"), None)],
        )
        .await;

        let ids: Vec<String> = db
            .list_crew(None)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.external_id)
            .collect();
        assert_eq!(ids, vec!["c2", "c3", "c1"]);
    }

    #[tokio::test]
    async fn test_search_filters_and_keeps_order() {
        let (db, _tmp) = setup_test_db().await;
        insert_crew(
            &db,
            &[
                ("c1", Some("Robert Behnken"), Some("NASA")),
                ("c2", Some("Douglas Hurley"), Some("NASA")),
                ("c3", Some("Soichi Noguchi"), Some("JAXA")),
                ("c4", Some("100% Pilot"), Some("ESA")),
            ],
        )
        .await;

        let ids = |crew: Vec<crate::db::CrewMember>| {
            crew.into_iter().map(|c| c.external_id).collect::<Vec<_>>()
        };

        // name, case-insensitive
        assert_eq!(ids(db.list_crew(Some("hurley")).await.unwrap()), vec!["c2"]);
        // agency, still ordered by name
        assert_eq!(
            ids(db.list_crew(Some("nasa")).await.unwrap()),
            vec!["c2", "c1"]
        );
        // LIKE wildcards match literally
        assert_eq!(ids(db.list_crew(Some("0%")).await.unwrap()), vec!["c4"]);
        assert!(db.list_crew(Some("_")).await.unwrap().is_empty());
        // blank term lists everything
        assert_eq!(db.list_crew(Some("  ")).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_search_payloads_by_orbit() {
        let (db, _tmp) = setup_test_db().await;
        let mut tx = db.begin().await.unwrap();
        for (ext, name, orbit) in [("p1", "Starlink-1", "VLEO"), ("p2", "Crew Dragon", "ISS")] {
            let record = PayloadRecord {
                name: Some(name.to_string()),
                orbit: Some(orbit.to_string()),
                ..Default::default()
            };
            write::upsert_payload(&mut tx, ext, &record, None)
                .await
                .unwrap();
        }
        tx.commit().await.unwrap();

        let found = db.list_payloads(Some("iss")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].external_id, "p2");
    }

    #[tokio::test]
    async fn test_detail_of_unknown_id_is_none() {
        let (db, _tmp) = setup_test_db().await;
        assert!(db.launch_detail("missing").await.unwrap().is_none());
        assert!(db.payload_detail("missing").await.unwrap().is_none());
        assert!(db.get_crew_member("missing").await.unwrap().is_none());
    }
}
