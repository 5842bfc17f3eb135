//! Cache subnet group late initialization and drift.

use super::tags::tag_map;
use super::{late_init_string, late_init_vec, string_set_equal};
use crate::aws::elasticache::{CacheSubnetGroup, CacheSubnetGroupInput};
use crate::crd::elasticache::{CacheSubnetGroupObservation, CacheSubnetGroupParameters};

pub fn late_initialize(params: &mut CacheSubnetGroupParameters, group: &CacheSubnetGroup) -> bool {
    late_init_string(&mut params.description, group.description.as_deref())
        | late_init_vec(&mut params.subnet_ids, &group.subnet_ids)
}

pub fn is_up_to_date(params: &CacheSubnetGroupParameters, group: &CacheSubnetGroup) -> bool {
    group.description.as_deref().unwrap_or_default() == params.description
        && string_set_equal(&params.subnet_ids, &group.subnet_ids)
}

pub fn generate_observation(group: &CacheSubnetGroup) -> CacheSubnetGroupObservation {
    CacheSubnetGroupObservation {
        arn: group.arn.clone(),
        vpc_id: group.vpc_id.clone(),
    }
}

pub fn generate_input(name: &str, params: &CacheSubnetGroupParameters) -> CacheSubnetGroupInput {
    CacheSubnetGroupInput {
        name: name.to_string(),
        description: params.description.clone(),
        subnet_ids: params.subnet_ids.clone(),
        tags: tag_map(&params.tags),
    }
}
