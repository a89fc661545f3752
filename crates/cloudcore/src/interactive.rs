//! Interactive resource selection
//!
//! A [`Selector`] lists candidates through a named [`ListingStrategy`], prints
//! them as a numbered menu and reads an index back. The registry is explicit:
//! the known resource types are exactly its keys.

use crate::cloud::Cloud;
use crate::error::{CloudError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

/// One menu entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SelectableItem {
    pub label: String,
    pub identifier: String,
}

impl SelectableItem {
    pub fn new(label: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            identifier: identifier.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Chosen(String),
    /// The listing had no candidates
    Empty,
}

/// Produces the candidates for one resource type
#[async_trait]
pub trait ListingStrategy: Send + Sync {
    async fn list(&self, cloud: &Cloud) -> Result<Vec<SelectableItem>>;
}

struct AvailabilityZones;
struct AutomationNodes;
struct Flavors;
struct Images;
struct KeyPairs;
struct Networks;
struct Projects;
struct SecurityGroups;
struct Servers;

#[async_trait]
impl ListingStrategy for AvailabilityZones {
    async fn list(&self, cloud: &Cloud) -> Result<Vec<SelectableItem>> {
        let zones = cloud.compute().availability_zones().await?;
        Ok(zones
            .into_iter()
            .map(|z| SelectableItem::new(z.name.clone(), z.name))
            .collect())
    }
}

#[async_trait]
impl ListingStrategy for AutomationNodes {
    async fn list(&self, cloud: &Cloud) -> Result<Vec<SelectableItem>> {
        let agents = cloud.automation().await?.agent_list().await?;
        Ok(agents
            .iter()
            .map(|(id, attributes)| {
                let label = attributes
                    .get("display_name")
                    .and_then(Value::as_str)
                    .unwrap_or(id);
                SelectableItem::new(label, id)
            })
            .collect())
    }
}

#[async_trait]
impl ListingStrategy for Flavors {
    async fn list(&self, cloud: &Cloud) -> Result<Vec<SelectableItem>> {
        let flavors = cloud.compute().flavors().await?;
        Ok(flavors
            .into_iter()
            .map(|f| SelectableItem::new(f.name, f.id))
            .collect())
    }
}

#[async_trait]
impl ListingStrategy for Images {
    async fn list(&self, cloud: &Cloud) -> Result<Vec<SelectableItem>> {
        let images = cloud.compute().images().await?;
        Ok(images
            .into_iter()
            .map(|i| SelectableItem::new(i.name, i.id))
            .collect())
    }
}

#[async_trait]
impl ListingStrategy for KeyPairs {
    async fn list(&self, cloud: &Cloud) -> Result<Vec<SelectableItem>> {
        let keys = cloud.compute().key_pairs().await?;
        Ok(keys
            .into_iter()
            .map(|k| SelectableItem::new(k.name.clone(), k.name))
            .collect())
    }
}

#[async_trait]
impl ListingStrategy for Networks {
    async fn list(&self, cloud: &Cloud) -> Result<Vec<SelectableItem>> {
        let networks = cloud.network().networks().await?;
        Ok(networks
            .into_iter()
            .map(|n| SelectableItem::new(n.name, n.id))
            .collect())
    }
}

#[async_trait]
impl ListingStrategy for Projects {
    async fn list(&self, cloud: &Cloud) -> Result<Vec<SelectableItem>> {
        let projects = cloud.project_list().await?;
        Ok(projects
            .into_iter()
            .map(|(id, attributes)| {
                let label = attributes
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(&id)
                    .to_string();
                SelectableItem::new(label, id)
            })
            .collect())
    }
}

#[async_trait]
impl ListingStrategy for SecurityGroups {
    async fn list(&self, cloud: &Cloud) -> Result<Vec<SelectableItem>> {
        let groups = cloud.compute().security_groups().await?;
        Ok(groups
            .into_iter()
            .map(|g| SelectableItem::new(g.name, g.id))
            .collect())
    }
}

#[async_trait]
impl ListingStrategy for Servers {
    async fn list(&self, cloud: &Cloud) -> Result<Vec<SelectableItem>> {
        let servers = cloud.compute().servers().await?;
        Ok(servers
            .into_iter()
            .map(|s| SelectableItem::new(s.name, s.id))
            .collect())
    }
}

pub struct Selector<'a> {
    cloud: &'a Cloud,
    strategies: BTreeMap<&'static str, Box<dyn ListingStrategy>>,
}

impl<'a> Selector<'a> {
    /// Selector with every built-in listing registered
    pub fn new(cloud: &'a Cloud) -> Self {
        let mut selector = Self::empty(cloud);
        selector.register("availability_zone", AvailabilityZones);
        selector.register("automation_node", AutomationNodes);
        selector.register("flavor", Flavors);
        selector.register("image", Images);
        selector.register("keypair", KeyPairs);
        selector.register("network", Networks);
        selector.register("project", Projects);
        selector.register("security_group", SecurityGroups);
        selector.register("server", Servers);
        selector
    }

    pub fn empty(cloud: &'a Cloud) -> Self {
        Self {
            cloud,
            strategies: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, name: &'static str, strategy: impl ListingStrategy + 'static) {
        self.strategies.insert(name, Box::new(strategy));
    }

    /// Registered resource types, sorted
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.keys().copied().collect()
    }

    /// Select on the process's standard streams
    pub async fn select(&self, resource_type: &str) -> Result<Selection> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        self.select_with(
            resource_type,
            &mut input,
            &mut io::stdout(),
            &mut io::stderr(),
        )
        .await
    }

    pub async fn select_with<R, W, E>(
        &self,
        resource_type: &str,
        input: &mut R,
        out: &mut W,
        err: &mut E,
    ) -> Result<Selection>
    where
        R: BufRead,
        W: Write,
        E: Write,
    {
        let Some(strategy) = self.strategies.get(resource_type) else {
            writeln!(
                err,
                "Unknown resource type \"{}\", you can select from the following types:\n",
                resource_type
            )?;
            writeln!(err, "{}\n", self.names().join("\n"))?;
            return Err(CloudError::UnknownResourceType(resource_type.to_string()));
        };

        let mut items = strategy.list(self.cloud).await?;
        tracing::debug!(resource_type, count = items.len(), "listed candidates");
        if items.is_empty() {
            writeln!(out, "Nothing found")?;
            return Ok(Selection::Empty);
        }
        items.sort();

        prompt(resource_type, &items, input, out, err)
    }
}

/// Print the menu and read indices until one is in range
fn prompt<R, W, E>(
    resource_type: &str,
    items: &[SelectableItem],
    input: &mut R,
    out: &mut W,
    err: &mut E,
) -> Result<Selection>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    writeln!(out, "\n{} list:", capitalize(resource_type))?;
    for (idx, item) in items.iter().enumerate() {
        writeln!(out, "{:>2} - {} ({})", idx, item.label, item.identifier)?;
    }

    let mut line = String::new();
    loop {
        write!(out, "Please enter {} number (0): ", resource_type)?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("no {} selected", resource_type),
            )
            .into());
        }

        let answer = line.trim();
        let index = if answer.is_empty() {
            Some(0)
        } else {
            answer.parse::<usize>().ok()
        };

        match index.and_then(|i| items.get(i)) {
            Some(item) => {
                tracing::debug!(resource_type, label = %item.label, "selected");
                return Ok(Selection::Chosen(item.identifier.clone()));
            }
            None => writeln!(err, "Error: Incorrect {} number", resource_type)?,
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
