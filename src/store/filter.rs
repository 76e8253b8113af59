//! Translates listing query parameters into a parameterized WHERE predicate.

use super::codec::split_tag_values;
use super::SqlValue;

/// Fixed price buckets offered by the listing search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceRange {
    /// price < 500
    Under500,
    /// 500 <= price <= 1000
    From500To1000,
    /// price > 1000
    Over1000,
}

impl PriceRange {
    /// Parses the bucket labels the listing UI sends. Anything else is no bucket at all.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "Menos de $500" => Some(Self::Under500),
            "$500 - $1000" => Some(Self::From500To1000),
            "Más de $1000" => Some(Self::Over1000),
            _ => None,
        }
    }
}

/// Search parameters for property listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilters {
    /// Property category, exact match
    pub property_type: Option<String>,
    /// City, exact match
    pub location: Option<String>,
    pub price_range: Option<PriceRange>,
    pub urbanization: Option<String>,
    pub security: Option<String>,
    /// Every tag listed here must be present on the property
    pub ambientes: Vec<String>,
    /// Case-insensitive substring of description, barrio, city or province
    pub search_term: Option<String>,
}

/// Predicate text with `?` placeholders and the values to bind, in placeholder order.
///
/// An empty `clause` means "match everything".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFilter {
    pub clause: String,
    pub params: Vec<SqlValue>,
}

impl CompiledFilter {
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }

    /// `" WHERE ..."` or nothing, ready to append to a SELECT.
    pub fn where_sql(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clause)
        }
    }
}

impl PropertyFilters {
    /// Builds filters from raw query pairs. Unknown keys and empty values are ignored;
    /// `ambientes` and `ambienteFilter` may repeat, and comma-separated values name one
    /// tag per piece.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filters = Self::default();

        for (key, value) in pairs {
            let value = value.as_ref();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "type" => filters.property_type = Some(value.to_string()),
                "location" => filters.location = Some(value.to_string()),
                "priceRange" => filters.price_range = PriceRange::parse(value),
                "urbanization" => filters.urbanization = Some(value.to_string()),
                "security" => filters.security = Some(value.to_string()),
                "ambientes" | "ambienteFilter" => {
                    filters.ambientes.extend(split_tag_values([value]))
                }
                "searchTerm" => filters.search_term = Some(value.to_string()),
                _ => {}
            }
        }

        filters
    }

    pub fn compile(&self) -> CompiledFilter {
        let mut conditions: Vec<&'static str> = Vec::new();
        let mut params = Vec::new();

        if let Some(property_type) = &self.property_type {
            conditions.push("property_type = ?");
            params.push(SqlValue::Text(property_type.clone()));
        }
        if let Some(city) = &self.location {
            conditions.push("city = ?");
            params.push(SqlValue::Text(city.clone()));
        }
        match self.price_range {
            Some(PriceRange::Under500) => {
                conditions.push("price < ?");
                params.push(SqlValue::Real(500.0));
            }
            Some(PriceRange::From500To1000) => {
                conditions.push("(price >= ? AND price <= ?)");
                params.push(SqlValue::Real(500.0));
                params.push(SqlValue::Real(1000.0));
            }
            Some(PriceRange::Over1000) => {
                conditions.push("price > ?");
                params.push(SqlValue::Real(1000.0));
            }
            None => {}
        }
        if let Some(urbanization) = &self.urbanization {
            conditions.push("urbanization = ?");
            params.push(SqlValue::Text(urbanization.clone()));
        }
        if let Some(security) = &self.security {
            conditions.push("security = ?");
            params.push(SqlValue::Text(security.clone()));
        }
        for ambiente in &self.ambientes {
            conditions.push("instr(',' || COALESCE(ambientes, '') || ',', ',' || ? || ',') > 0");
            params.push(SqlValue::Text(ambiente.clone()));
        }
        if let Some(term) = &self.search_term {
            conditions.push(
                r"(description LIKE ? ESCAPE '\' OR barrio LIKE ? ESCAPE '\' OR city LIKE ? ESCAPE '\' OR province LIKE ? ESCAPE '\')",
            );
            let pattern = like_pattern(term);
            params.extend(std::iter::repeat(SqlValue::Text(pattern)).take(4));
        }

        CompiledFilter {
            clause: conditions.join(" AND "),
            params,
        }
    }
}

fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
