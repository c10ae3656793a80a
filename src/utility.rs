//! Series alignment helpers
//!
//! Functions that line series up with an authoritative timestamp grid and
//! split multi-column observation bundles by station. Both sequences are
//! expected in ascending time order; every walk is a single synchronized
//! pass over the two.

use tracing::debug;

use crate::aggregation::{Aggregatable, Aggregator, DataFunctions};
use crate::error::{Result, UtilityError};
use crate::types::{LocalDateTime, TimeSeries, TimeSeriesGroup, TimeSeriesVector, TimedValue, Value};

/// Station identifier with the columns of its contiguous block
pub type StationTimeSeries = (i32, TimeSeriesVector);

/// Drop samples whose timestamp is not in `timesteps`
///
/// Used to strip the samples that only served as look-behind or look-ahead
/// context for aggregation.
pub fn erase_redundant_timesteps(ts: TimeSeries, timesteps: &[LocalDateTime]) -> TimeSeries {
    if ts.is_empty() {
        return ts;
    }

    let mut keep = Vec::with_capacity(ts.len());
    let mut next = 0;
    for tv in ts.iter() {
        while next < timesteps.len() && tv.time > timesteps[next] {
            next += 1;
        }
        let valid = next < timesteps.len() && timesteps[next] == tv.time;
        if valid {
            next += 1;
        }
        keep.push(valid);
    }

    if keep.iter().all(|k| *k) {
        return ts;
    }

    ts.into_iter()
        .zip(keep)
        .filter_map(|(tv, k)| k.then_some(tv))
        .collect()
}

/// `erase_redundant_timesteps` for every column
pub fn erase_redundant_timesteps_vector(
    tsv: TimeSeriesVector,
    timesteps: &[LocalDateTime],
) -> TimeSeriesVector {
    tsv.into_iter()
        .map(|ts| erase_redundant_timesteps(ts, timesteps))
        .collect()
}

/// `erase_redundant_timesteps` for every group member
pub fn erase_redundant_timesteps_group(
    group: TimeSeriesGroup,
    timesteps: &[LocalDateTime],
) -> TimeSeriesGroup {
    group
        .into_iter()
        .map(|mut member| {
            member.timeseries = erase_redundant_timesteps(member.timeseries, timesteps);
            member
        })
        .collect()
}

/// Insert a missing value for every grid timestamp the series lacks
///
/// Samples that are not on the grid are kept in place.
pub fn add_missing_timesteps(ts: &TimeSeries, timesteps: &[LocalDateTime]) -> TimeSeries {
    let mut ret = TimeSeries::with_capacity(ts.len().max(timesteps.len()));
    let mut grid = timesteps.iter().peekable();

    for tv in ts.iter() {
        while let Some(&&t) = grid.peek() {
            if t < tv.time {
                ret.push(TimedValue::missing(t));
                grid.next();
            } else {
                if t == tv.time {
                    grid.next();
                }
                break;
            }
        }
        ret.push(tv.clone());
    }
    ret.extend(grid.map(|&t| TimedValue::missing(t)));
    ret
}

/// `add_missing_timesteps` for every column
pub fn add_missing_timesteps_vector(
    tsv: &TimeSeriesVector,
    timesteps: &[LocalDateTime],
) -> TimeSeriesVector {
    tsv.iter()
        .map(|ts| add_missing_timesteps(ts, timesteps))
        .collect()
}

fn station_id(value: &Value) -> Result<i32> {
    let id = match value {
        Value::Int(_) | Value::Double(_) | Value::String(_) => value.as_int().ok(),
        Value::None | Value::LonLat(_) | Value::DateTime(_) => None,
    };
    id.ok_or_else(|| {
        UtilityError::InvalidStationId {
            value: format!("{} ({})", value, value.type_name()),
        }
        .into()
    })
}

/// Station identifier stored in the first sample of a station column
pub fn get_station_id_value(ts: &TimeSeries) -> Result<i32> {
    let first = ts.first().ok_or(UtilityError::EmptyStationColumn)?;
    station_id(&first.value)
}

/// Split a multi-column bundle into one bundle per station
///
/// Column `station_index` holds the station identifier; consecutive rows
/// with the same identifier form one station's block. Each block gets its
/// own copy of the columns, padded with missing values onto `timesteps`.
pub fn get_timeseries_by_station(
    tsv: &TimeSeriesVector,
    timesteps: &[LocalDateTime],
    station_index: usize,
) -> Result<Vec<StationTimeSeries>> {
    let station_column = tsv
        .get(station_index)
        .ok_or(UtilityError::StationIndexOutOfBounds {
            index: station_index,
            columns: tsv.len(),
        })?;

    let ids = station_column
        .iter()
        .map(|tv| station_id(&tv.value))
        .collect::<Result<Vec<i32>>>()?;

    let mut ret = Vec::new();
    let mut begin = 0;
    while begin < ids.len() {
        let id = ids[begin];
        let len = ids[begin..].iter().take_while(|&&other| other == id).count();

        let block: TimeSeriesVector = tsv
            .iter()
            .map(|column| column.iter().skip(begin).take(len).cloned().collect())
            .collect();
        ret.push((id, add_missing_timesteps_vector(&block, timesteps)));

        begin += len;
    }

    debug!(stations = ret.len(), rows = ids.len(), "split bundle by station");
    Ok(ret)
}

/// Aggregate a series or group with a fresh aggregator
pub fn aggregate<T: Aggregatable>(
    raw: &T,
    functions: &DataFunctions,
    timesteps: &[LocalDateTime],
) -> Result<T> {
    Aggregator::new().aggregate(raw, functions, timesteps)
}
