//! JOIN conversion: a cross-collection join around a simple filter.

use super::simple::SimpleFilterConverter;
use super::{ConvertedFilter, FilterConverter};
use crate::error::FilterResult;
use crate::query::QuickGoQuery;
use crate::registry::{
    ExecutionType, FROM_ATTRIBUTE, FROM_TABLE, FilterConfig, TO_ATTRIBUTE, TO_TABLE,
};
use crate::request::FilterRequest;

#[derive(Debug, Clone)]
pub struct JoinFilterConverter {
    from_table: String,
    from_attribute: String,
    to_table: String,
    to_attribute: String,
    simple: SimpleFilterConverter,
}

impl JoinFilterConverter {
    /// Fails with a configuration error when any join property is missing.
    pub fn new(config: &FilterConfig) -> FilterResult<Self> {
        ExecutionType::Join.validate(&config.properties)?;

        let property = |key: &str| config.property(key).unwrap_or_default().trim().to_string();
        Ok(Self {
            from_table: property(FROM_TABLE),
            from_attribute: property(FROM_ATTRIBUTE),
            to_table: property(TO_TABLE),
            to_attribute: property(TO_ATTRIBUTE),
            simple: SimpleFilterConverter::new(),
        })
    }
}

impl FilterConverter for JoinFilterConverter {
    /// A request that carries values restricts the "from" side with its
    /// simple conversion; a name-only request joins unfiltered.
    fn transform(&self, request: &FilterRequest) -> FilterResult<ConvertedFilter<QuickGoQuery>> {
        let query = if request.has_values() {
            QuickGoQuery::create_join_query_with_filter(
                &self.from_table,
                &self.from_attribute,
                &self.to_table,
                &self.to_attribute,
                self.simple.to_query(request)?,
            )?
        } else {
            QuickGoQuery::create_join_query(
                &self.from_table,
                &self.from_attribute,
                &self.to_table,
                &self.to_attribute,
            )?
        };
        Ok(ConvertedFilter::new(query))
    }
}
