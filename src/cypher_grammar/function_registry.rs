//! Builder aggregate name to Cypher function registry
//!
//! Aggregate wrappers pass their function name explicitly; this table maps it
//! to the Cypher spelling and argument shape.

use std::collections::HashMap;

/// Function mapping entry
#[derive(Clone, Debug)]
pub struct AggregateMapping {
    /// Cypher function name
    pub cypher_name: &'static str,
    /// Render the argument as `DISTINCT arg`
    pub distinct: bool,
    /// Append the percentile as a second argument
    pub takes_percentile: bool,
}

/// Get aggregate mapping for a builder function name
pub fn get_aggregate_mapping(function: &str) -> Option<AggregateMapping> {
    let fn_lower = function.to_lowercase();
    AGGREGATE_MAPPINGS.get(fn_lower.as_str()).cloned()
}

const fn plain(cypher_name: &'static str) -> AggregateMapping {
    AggregateMapping {
        cypher_name,
        distinct: false,
        takes_percentile: false,
    }
}

// Static aggregate mapping table
lazy_static::lazy_static! {
    static ref AGGREGATE_MAPPINGS: HashMap<&'static str, AggregateMapping> = {
        let mut m = HashMap::new();

        m.insert("count", plain("count"));
        m.insert("sum", plain("sum"));
        m.insert("avg", plain("avg"));
        m.insert("min", plain("min"));
        m.insert("max", plain("max"));
        m.insert("collect", plain("collect"));

        // stdev() / stdevp() -> stDev() / stDevP()
        m.insert("stdev", plain("stDev"));
        m.insert("stdevp", plain("stDevP"));

        // countDistinct(x) -> count(DISTINCT x)
        m.insert("countdistinct", AggregateMapping {
            cypher_name: "count",
            distinct: true,
            takes_percentile: false,
        });

        // percentileDisc(x, p) / percentileCont(x, p)
        m.insert("percentiledisc", AggregateMapping {
            cypher_name: "percentileDisc",
            distinct: false,
            takes_percentile: true,
        });
        m.insert("percentilecont", AggregateMapping {
            cypher_name: "percentileCont",
            distinct: false,
            takes_percentile: true,
        });

        m
    };
}
