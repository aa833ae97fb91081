//! Semantics model: the cubes describing one Pulse application's data.
//!
//! A cube is either an **endpoint** (it carries a predefined `sql` statement
//! and is queried with structured parameters) or a **raw table** (queried with
//! ad hoc SQL). The split is by `sql` alone: a non-blank `sql` makes a cube an
//! endpoint even when it also names a `sql_table`.
//!
//! ```rust,ignore
//! let semantics = Semantics::fetch(&client).await?;
//! let endpoints = semantics.filter_endpoints();
//! println!("{}", endpoints.to_text()?);
//! ```

use crate::client::PulseApi;
use crate::error::{PulseError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

/// One column in a cube's result schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    /// Column name. Falls back to the map key when omitted.
    #[serde(default)]
    pub name: String,

    /// SQL type of the column.
    #[serde(alias = "type")]
    pub sql_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An endpoint parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name. Falls back to the map key when omitted.
    #[serde(default)]
    pub name: String,

    #[serde(alias = "type")]
    pub sql_type: String,

    /// Default value; a parameter without one is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
}

impl Parameter {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Whether a cube is queried through an endpoint or with raw SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeKind {
    Endpoint,
    RawTable,
}

/// A named unit of the remote schema.
///
/// Field order here is the field order of the rendered text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cube {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Backing table for raw table cubes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_table: Option<String>,

    /// Predefined query for endpoint cubes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,

    /// Names of cubes this one builds on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Parameter>,

    #[serde(default)]
    pub dimensions: IndexMap<String, Dimension>,
}

impl Cube {
    /// Create an empty raw table cube.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            sql_table: None,
            sql: None,
            extends: None,
            parameters: IndexMap::new(),
            dimensions: IndexMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_sql_table(mut self, table: impl Into<String>) -> Self {
        self.sql_table = Some(table.into());
        self
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    /// Add a dimension keyed by its name.
    pub fn with_dimension(
        mut self,
        name: impl Into<String>,
        sql_type: impl Into<String>,
        description: Option<&str>,
    ) -> Self {
        let name = name.into();
        self.dimensions.insert(
            name.clone(),
            Dimension {
                name,
                sql_type: sql_type.into(),
                description: description.map(str::to_string),
            },
        );
        self
    }

    /// Add a parameter keyed by its name.
    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        sql_type: impl Into<String>,
        default: Option<JsonValue>,
    ) -> Self {
        let name = name.into();
        self.parameters.insert(
            name.clone(),
            Parameter {
                name,
                sql_type: sql_type.into(),
                default,
            },
        );
        self
    }

    pub fn kind(&self) -> CubeKind {
        match self.sql.as_deref() {
            Some(sql) if !sql.trim().is_empty() => CubeKind::Endpoint,
            _ => CubeKind::RawTable,
        }
    }

    pub fn is_endpoint(&self) -> bool {
        self.kind() == CubeKind::Endpoint
    }

    /// Table name used in generated SQL: `sql_table`, or the cube name.
    pub fn table_name(&self) -> &str {
        self.sql_table
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.name)
    }

    /// Identifier shown to the model: `id`, or the cube name.
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }

    /// Parameters without a default value.
    pub fn required_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values().filter(|p| p.is_required())
    }

    fn fill_names(&mut self) {
        for (key, dim) in self.dimensions.iter_mut() {
            if dim.name.is_empty() {
                dim.name = key.clone();
            }
        }
        for (key, param) in self.parameters.iter_mut() {
            if param.name.is_empty() {
                param.name = key.clone();
            }
        }
    }
}

/// The full schema payload for one application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Semantics {
    cubes: Vec<Cube>,
}

impl Semantics {
    /// Fetch semantics through the client. Called once per toolkit.
    pub async fn fetch(api: &dyn PulseApi) -> Result<Self> {
        api.fetch_semantics().await
    }

    pub fn from_cubes(cubes: Vec<Cube>) -> Self {
        let mut semantics = Self { cubes };
        semantics.normalize();
        semantics
    }

    /// Decode a `{"cubes": [...]}` payload.
    pub fn from_value(payload: JsonValue) -> Result<Self> {
        let cubes = match payload {
            JsonValue::Object(mut map) => match map.remove("cubes") {
                Some(JsonValue::Array(cubes)) => cubes,
                Some(_) => {
                    return Err(PulseError::RemoteFetch("`cubes` is not a list".to_string()))
                }
                None => {
                    return Err(PulseError::RemoteFetch(
                        "payload has no `cubes` list".to_string(),
                    ))
                }
            },
            _ => {
                return Err(PulseError::RemoteFetch(
                    "payload is not a JSON object".to_string(),
                ))
            }
        };

        let cubes = cubes
            .into_iter()
            .enumerate()
            .map(|(index, cube)| {
                serde_json::from_value::<Cube>(cube).map_err(|e| {
                    PulseError::RemoteFetch(format!("malformed cube at index {}: {}", index, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(cubes = cubes.len(), "Decoded semantics payload");
        Ok(Self::from_cubes(cubes))
    }

    fn normalize(&mut self) {
        for cube in &mut self.cubes {
            cube.fill_names();
        }
    }

    pub fn cubes(&self) -> &[Cube] {
        &self.cubes
    }

    pub fn len(&self) -> usize {
        self.cubes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cubes.is_empty()
    }

    pub fn find_cube(&self, name: &str) -> Option<&Cube> {
        self.cubes.iter().find(|c| c.name == name)
    }

    /// Endpoint cube by name.
    pub fn find_endpoint(&self, name: &str) -> Option<&Cube> {
        self.find_cube(name).filter(|c| c.is_endpoint())
    }

    pub fn view(&self) -> SemanticsView<'_> {
        SemanticsView {
            cubes: self.cubes.iter().collect(),
        }
    }

    /// Cubes carrying a predefined query.
    pub fn filter_endpoints(&self) -> SemanticsView<'_> {
        self.filter(CubeKind::Endpoint)
    }

    /// Cubes without a predefined query.
    pub fn filter_tables(&self) -> SemanticsView<'_> {
        self.filter(CubeKind::RawTable)
    }

    fn filter(&self, kind: CubeKind) -> SemanticsView<'_> {
        SemanticsView {
            cubes: self.cubes.iter().filter(|c| c.kind() == kind).collect(),
        }
    }
}

/// A read-only selection of cubes borrowed from a [`Semantics`].
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticsView<'a> {
    cubes: Vec<&'a Cube>,
}

#[derive(Serialize)]
struct ViewDocument<'v, 'a> {
    cubes: &'v [&'a Cube],
}

impl<'a> SemanticsView<'a> {
    pub fn cubes(&self) -> &[&'a Cube] {
        &self.cubes
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Cube> + '_ {
        self.cubes.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.cubes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cubes.is_empty()
    }

    /// Render as a YAML document `cubes: [...]`.
    pub fn to_text(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&ViewDocument { cubes: &self.cubes })?)
    }

    /// Parse text produced by [`SemanticsView::to_text`] into owned semantics.
    pub fn from_text(text: &str) -> Result<Semantics> {
        let mut semantics: Semantics = serde_yaml::from_str(text)?;
        semantics.normalize();
        Ok(semantics)
    }

    /// Copy the selected cubes into owned semantics.
    pub fn to_owned_semantics(&self) -> Semantics {
        Semantics::from_cubes(self.cubes.iter().map(|c| (*c).clone()).collect())
    }
}

/// Render a view as text. Same as [`SemanticsView::to_text`].
pub fn serialize_text(view: &SemanticsView<'_>) -> Result<String> {
    view.to_text()
}
