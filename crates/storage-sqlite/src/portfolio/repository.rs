use std::collections::BTreeMap;

use async_trait::async_trait;
use log::{debug, info};
use rusqlite::params;

use papertrade_core::errors::Result;
use papertrade_core::orders::OrderStatus;
use papertrade_core::portfolio::growth::PortfolioGrowthPoint;
use papertrade_core::portfolio::state::PortfolioDetails;
use papertrade_core::portfolio::PortfolioRepositoryTrait;

use crate::db::{Database, WriteHandle};
use crate::documents::{self, DocumentKind};
use crate::errors::IntoCore;

/// Details and growth documents of each user.
pub struct PortfolioRepository {
    db: Database,
    writer: WriteHandle,
}

impl PortfolioRepository {
    pub fn new(db: Database, writer: WriteHandle) -> Self {
        Self { db, writer }
    }
}

/// Orders points by date, keeping the first point seen for a date.
fn by_date(points: Vec<PortfolioGrowthPoint>) -> Vec<PortfolioGrowthPoint> {
    let mut unique = BTreeMap::new();
    for point in points {
        unique.entry(point.date).or_insert(point);
    }
    unique.into_values().collect()
}

#[async_trait]
impl PortfolioRepositoryTrait for PortfolioRepository {
    fn get_portfolio_details(&self, user_id: &str) -> Result<Option<PortfolioDetails>> {
        self.db
            .read(|conn| documents::load(conn, user_id, DocumentKind::PortfolioDetails))
    }

    async fn save_portfolio_details(&self, user_id: &str, details: PortfolioDetails) -> Result<()> {
        let user_id = user_id.to_string();
        self.writer
            .exec(move |conn| {
                documents::store(conn, &user_id, DocumentKind::PortfolioDetails, &details)
            })
            .await
    }

    fn get_growth(&self, user_id: &str) -> Result<Vec<PortfolioGrowthPoint>> {
        let points: Option<Vec<PortfolioGrowthPoint>> = self
            .db
            .read(|conn| documents::load(conn, user_id, DocumentKind::Growth))?;
        Ok(points.unwrap_or_default())
    }

    async fn replace_growth(&self, user_id: &str, points: Vec<PortfolioGrowthPoint>) -> Result<()> {
        let user_id = user_id.to_string();
        let points = by_date(points);
        self.writer
            .exec(move |conn| {
                debug!("Replacing growth series of {} with {} points", user_id, points.len());
                documents::store(conn, &user_id, DocumentKind::Growth, &points)
            })
            .await
    }

    async fn append_growth(
        &self,
        user_id: &str,
        points: Vec<PortfolioGrowthPoint>,
    ) -> Result<usize> {
        let user_id = user_id.to_string();
        self.writer
            .exec(move |conn| {
                let stored: Vec<PortfolioGrowthPoint> =
                    documents::load(conn, &user_id, DocumentKind::Growth)?.unwrap_or_default();
                let before = stored.len();
                let merged = by_date(stored.into_iter().chain(points.iter().cloned()).collect());
                let added = merged.len().saturating_sub(before);
                if added > 0 {
                    documents::store(conn, &user_id, DocumentKind::Growth, &merged)?;
                }
                Ok(added)
            })
            .await
    }

    async fn reset_user(&self, user_id: &str, details: PortfolioDetails) -> Result<()> {
        let user_id = user_id.to_string();
        self.writer
            .exec(move |conn| {
                documents::remove(conn, &user_id, DocumentKind::Ledger)?;
                documents::remove(conn, &user_id, DocumentKind::Growth)?;
                let cancelled = conn
                    .execute(
                        "DELETE FROM outstanding_orders WHERE user_id = ?1 AND status = ?2",
                        params![user_id, OrderStatus::Open.as_str()],
                    )
                    .into_core()?;
                documents::store(conn, &user_id, DocumentKind::PortfolioDetails, &details)?;
                info!("Reset portfolio of {}, removed {} open orders", user_id, cancelled);
                Ok(())
            })
            .await
    }
}
