use crate::feeds::{Feed, FeedContext};
use crate::objects::{Catalog, OrbitalObject, SharedState, Sgp4Propagator};
use crate::prelude::{BoxFuture, Category, FeedError, FeedResult};
use crate::telemetry::LogManager;
use std::sync::Arc;
use std::time::Duration;

const CACHE_KEY: &str = "catalog";

/// A single `(predicate, category)` pair.
pub struct CategoryRule {
    predicate: Box<dyn Fn(&str) -> bool + Send + Sync>,
    category: Category,
}

impl CategoryRule {
    pub fn new<F>(predicate: F, category: Category) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            category,
        }
    }

    /// Matches when the upper-cased object name contains `fragment`.
    pub fn contains(fragment: &'static str, category: Category) -> Self {
        Self::new(move |name| name.contains(fragment), category)
    }
}

/// Ordered rule list, first match wins, fallback last.
pub struct CategoryRules {
    rules: Vec<CategoryRule>,
    fallback: Category,
}

impl CategoryRules {
    pub fn new(rules: Vec<CategoryRule>, fallback: Category) -> Self {
        Self { rules, fallback }
    }

    pub fn classify(&self, name: &str) -> Category {
        let name = name.to_ascii_uppercase();
        self.rules
            .iter()
            .find(|rule| (rule.predicate)(&name))
            .map(|rule| rule.category)
            .unwrap_or(self.fallback)
    }
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self::new(
            vec![
                CategoryRule::contains("STARLINK", Category::Starlink),
                CategoryRule::contains("ONEWEB", Category::OneWeb),
                CategoryRule::contains("ISS (", Category::Station),
                CategoryRule::contains("CSS (", Category::Station),
                CategoryRule::contains("TIANHE", Category::Station),
                CategoryRule::contains("IRIDIUM", Category::Iridium),
                CategoryRule::contains("NAVSTAR", Category::Gps),
                CategoryRule::contains("GPS ", Category::Gps),
                CategoryRule::contains("GLONASS", Category::Glonass),
                CategoryRule::contains("GALILEO", Category::Galileo),
                CategoryRule::contains("BEIDOU", Category::Beidou),
            ],
            Category::Other,
        )
    }
}

/// Parses three-line element groups. Groups that are misaligned or that the
/// propagator rejects are dropped; the second value counts them.
pub fn parse_catalog(text: &str, rules: &CategoryRules) -> (Vec<OrbitalObject>, usize) {
    let lines: Vec<&str> = text
        .lines()
        .map(|line| line.trim_end())
        .filter(|line| !line.trim().is_empty())
        .collect();

    let mut objects = Vec::new();
    let mut dropped = 0;
    let mut index = 0;
    while index < lines.len() {
        let group = lines.get(index..index + 3);
        let Some([name, line1, line2]) = group else {
            dropped += 1;
            break;
        };
        if !line1.starts_with("1 ") || !line2.starts_with("2 ") {
            dropped += 1;
            index += 1;
            continue;
        }

        let name = name.trim();
        match Sgp4Propagator::from_tle(name, line1, line2) {
            Ok(propagator) => objects.push(OrbitalObject::new(
                name,
                rules.classify(name),
                Arc::new(propagator),
            )),
            Err(_) => dropped += 1,
        }
        index += 3;
    }

    (objects, dropped)
}

/// Orbital element catalog, replaced whole on every successful refresh.
pub struct CatalogFeed {
    url: String,
    ttl: Duration,
    rules: CategoryRules,
    logger: LogManager,
}

impl CatalogFeed {
    pub fn new(url: impl Into<String>, ttl: Duration, rules: CategoryRules) -> Self {
        Self {
            url: url.into(),
            ttl,
            rules,
            logger: LogManager::new("catalog"),
        }
    }

    async fn load(&self, ctx: &FeedContext, state: &SharedState) -> FeedResult<String> {
        let (objects, dropped) = ctx
            .cache
            .fetch_text_with_cache(ctx.transport.as_ref(), &self.url, CACHE_KEY, self.ttl, |text| {
                let (objects, dropped) = parse_catalog(text, &self.rules);
                if objects.is_empty() {
                    Err(FeedError::Empty(format!("no element sets in {}", self.url)))
                } else {
                    Ok((objects, dropped))
                }
            })
            .await?;
        if dropped > 0 {
            self.logger
                .detail(&format!("dropped {dropped} malformed element groups"));
        }

        let count = objects.len();
        state.replace_catalog(Catalog::new(objects));
        Ok(format!("{count} orbital objects ({dropped} dropped)"))
    }
}

impl Feed for CatalogFeed {
    fn name(&self) -> &'static str {
        "catalog"
    }

    fn refresh<'a>(
        &'a self,
        ctx: &'a FeedContext,
        state: &'a SharedState,
    ) -> BoxFuture<'a, FeedResult<String>> {
        Box::pin(self.load(ctx, state))
    }
}
