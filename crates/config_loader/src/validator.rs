//! 配置校验模块
//!
//! 校验规则：
//! - port_start <= port_end
//! - dwell_s > 0, timeout_s > 0
//! - max_update_hz >= 0 且有限
//! - scale > 0 且有限
//! - tick_hz > 0, 插值速度 >= 0
//! - 监听缓冲区与单次 poll 上限 > 0
//! - initial_placement 有限

use contracts::{BridgeConfig, ContractError};

/// 校验 BridgeConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &BridgeConfig) -> Result<(), ContractError> {
    validate_listener(config)?;
    validate_discovery(config)?;
    validate_reconciler(config)?;
    validate_consumer(config)?;
    Ok(())
}

fn validate_listener(config: &BridgeConfig) -> Result<(), ContractError> {
    let listener = &config.listener;

    if listener.receive_buffer_size == 0 {
        return Err(ContractError::config_validation(
            "listener.receive_buffer_size",
            "receive_buffer_size must be > 0",
        ));
    }

    if listener.max_datagrams_per_poll == 0 {
        return Err(ContractError::config_validation(
            "listener.max_datagrams_per_poll",
            "max_datagrams_per_poll must be > 0",
        ));
    }

    Ok(())
}

/// 校验端口发现配置
fn validate_discovery(config: &BridgeConfig) -> Result<(), ContractError> {
    let discovery = &config.discovery;

    if discovery.port_start > discovery.port_end {
        return Err(ContractError::config_validation(
            "discovery.port_start / discovery.port_end",
            format!(
                "port_start ({}) must be <= port_end ({})",
                discovery.port_start, discovery.port_end
            ),
        ));
    }

    if !(discovery.dwell_s.is_finite() && discovery.dwell_s > 0.0) {
        return Err(ContractError::config_validation(
            "discovery.dwell_s",
            format!("dwell_s must be > 0, got {}", discovery.dwell_s),
        ));
    }

    if !(discovery.timeout_s.is_finite() && discovery.timeout_s > 0.0) {
        return Err(ContractError::config_validation(
            "discovery.timeout_s",
            format!("timeout_s must be > 0, got {}", discovery.timeout_s),
        ));
    }

    Ok(())
}

/// 校验限频与坐标配置
fn validate_reconciler(config: &BridgeConfig) -> Result<(), ContractError> {
    let reconciler = &config.reconciler;

    if !(reconciler.max_update_hz.is_finite() && reconciler.max_update_hz >= 0.0) {
        return Err(ContractError::config_validation(
            "reconciler.max_update_hz",
            format!(
                "max_update_hz must be >= 0 (0 = unlimited), got {}",
                reconciler.max_update_hz
            ),
        ));
    }

    if !(reconciler.scale.is_finite() && reconciler.scale > 0.0) {
        return Err(ContractError::config_validation(
            "reconciler.scale",
            format!("scale must be > 0, got {}", reconciler.scale),
        ));
    }

    if !reconciler.initial_placement.is_finite() {
        return Err(ContractError::config_validation(
            "reconciler.initial_placement",
            "initial_placement must be finite",
        ));
    }

    Ok(())
}

fn validate_consumer(config: &BridgeConfig) -> Result<(), ContractError> {
    let consumer = &config.consumer;

    if !(consumer.tick_hz.is_finite() && consumer.tick_hz > 0.0) {
        return Err(ContractError::config_validation(
            "consumer.tick_hz",
            format!("tick_hz must be > 0, got {}", consumer.tick_hz),
        ));
    }

    for (field, value) in [
        ("consumer.smooth_speed", consumer.smooth_speed),
        ("consumer.face_speed", consumer.face_speed),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(ContractError::config_validation(
                field,
                format!("interpolation speed must be >= 0, got {value}"),
            ));
        }
    }

    Ok(())
}
