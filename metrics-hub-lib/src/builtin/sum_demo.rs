use crate::error::HubError;
use crate::metrics::{MetricImpl, MetricModule, MetricValue, Params};
use crate::register_metric;

pub const MODULE: MetricModule = MetricModule::new("sum_demo", bindings);

fn bindings() -> Result<Vec<MetricImpl>, HubError> {
    Ok(vec![register_metric!("sum_demo", sum_demo)])
}

/// Sum of `numbers`.
pub fn sum_demo(params: &Params) -> Result<MetricValue, HubError> {
    let numbers = params.numbers("numbers")?;
    Ok(MetricValue::Float(numbers.iter().sum()))
}
