//! Bring-up configuration.
//!
//! Groups the platform knobs spec.md §6 enumerates into one struct rather
//! than the scattered `#define`s in `original_source/main/config.h` /
//! `can.c` / `bt.c` (`UART_BAUDRATE`, `CONFIG_APP_BT_QUEUES_LEN`,
//! `CAN_TX_GPIO_NUM`/`CAN_RX_GPIO_NUM`, `*_TASK_PRIO`). The protocol core
//! never reads these fields itself; they exist so a binary composing this
//! crate has one place to source them, the way the teacher keeps
//! platform-specific knobs out of the protocol engine and behind feature
//! flags in `Cargo.toml` instead.

/// Task priorities, kept as plain `u8` the way the original firmware keeps
/// them as FreeRTOS task-priority integers — the core never interprets
/// these, it only carries them through to whatever scheduler a binary uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPriorities {
    pub ingress: u8,
    pub egress: u8,
    pub command_processor: u8,
    pub receive_pump: u8,
}

impl Default for TaskPriorities {
    fn default() -> Self {
        // original_source/main/config.h and can.c use 1 for every task in
        // this path; there is no priority differentiation in the source.
        Self {
            ingress: 1,
            egress: 1,
            command_processor: 1,
            receive_pump: 1,
        }
    }
}

/// CAN controller pin assignment, grounded in
/// `original_source/main/can.c`'s `CAN_TX_GPIO_NUM`/`CAN_RX_GPIO_NUM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanPins {
    pub tx_gpio: u32,
    pub rx_gpio: u32,
}

impl Default for CanPins {
    fn default() -> Self {
        Self {
            tx_gpio: 21,
            rx_gpio: 22,
        }
    }
}

/// Bring-up configuration for the adapter. Not persisted; constructed once
/// at startup and handed to the wiring layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Depth of the serial ingress queue. `BT_RX_QUEUE_LEN` in spec.md §6,
    /// grounded in `CONFIG_APP_BT_QUEUES_LEN` (`bt.c::btRxQueue`).
    pub ingress_queue_len: usize,
    /// Depth of the serial egress queue. `BT_TX_QUEUE_LEN` in spec.md §6,
    /// grounded in `CONFIG_APP_BT_QUEUES_LEN` (`bt.c::btTxQueue`).
    pub egress_queue_len: usize,
    /// Depth of the internal CAN receive buffer, if the driver buffers
    /// ahead of the pump. `CAN_RX_QUEUE_LEN` in spec.md §6, grounded in
    /// `can.c::canRxQueue` (`xQueueCreate(8, ...)`).
    pub can_rx_queue_len: usize,
    pub task_priorities: TaskPriorities,
    pub can_pins: CanPins,
    /// Serial transport baud rate. `original_source/main/config.h`'s
    /// `UART_BAUDRATE`.
    pub baud_rate: u32,
    /// Low two bytes of the device's hardware address, used to answer the
    /// `N` (serial number) command per spec.md §6.
    pub serial_number_suffix: [u8; 2],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ingress_queue_len: 8,
            egress_queue_len: 8,
            can_rx_queue_len: 8,
            task_priorities: TaskPriorities::default(),
            can_pins: CanPins::default(),
            baud_rate: 921_600,
            serial_number_suffix: [0, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_firmware_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.baud_rate, 921_600);
        assert_eq!(cfg.can_pins.tx_gpio, 21);
        assert_eq!(cfg.can_pins.rx_gpio, 22);
    }
}
