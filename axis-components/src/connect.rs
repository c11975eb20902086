// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Helper connection macros

pub use paste::paste;

#[macro_export]
/// Connect an [OutPort](axis_engine::port::OutPort) port to an
/// [InPort](axis_engine::port::InPort)
///
/// Indexed ports are accessed with `connect_port_<name>_i()` and
/// `port_<name>_i()`. The macro evaluates to a
/// [SimResult](axis_engine::types::SimResult).
macro_rules! connect_port {
    ($from:expr, $from_port_name:ident => $to:expr, $to_port_name:ident) => {{
        axis_track::debug!($from.entity ; "Connect {}.{} => {}.{}", $from.entity, stringify!($from_port_name), $to.entity, stringify!($to_port_name));
        $crate::connect::paste! {
            $from.[< connect_port_ $from_port_name >]($to.[< port_ $to_port_name >]())
        }
    }};
    ($from:expr, $from_port_name:ident, $from_index:expr => $to:expr, $to_port_name:ident) => {{
        let from_index: usize = $from_index;
        axis_track::debug!($from.entity ; "Connect {}.{}[{}] => {}.{}", $from.entity, stringify!($from_port_name), from_index, $to.entity, stringify!($to_port_name));
        $crate::connect::paste! {
            $from.[< connect_port_ $from_port_name _i >](from_index, $to.[< port_ $to_port_name >]())
        }
    }};
    ($from:expr, $from_port_name:ident => $to:expr, $to_port_name:ident, $to_index:expr) => {{
        let to_index: usize = $to_index;
        axis_track::debug!($from.entity ; "Connect {}.{} => {}.{}[{}]", $from.entity, stringify!($from_port_name), $to.entity, stringify!($to_port_name), to_index);
        $crate::connect::paste! {
            $to.[< port_ $to_port_name _i >](to_index)
                .and_then(|state| $from.[< connect_port_ $from_port_name >](state))
        }
    }};
    ($from:expr, $from_port_name:ident, $from_index:expr => $to:expr, $to_port_name:ident, $to_index:expr) => {{
        let from_index: usize = $from_index;
        let to_index: usize = $to_index;
        axis_track::debug!($from.entity ; "Connect {}.{}[{}] => {}.{}[{}]", $from.entity, stringify!($from_port_name), from_index, $to.entity, stringify!($to_port_name), to_index);
        $crate::connect::paste! {
            $to.[< port_ $to_port_name _i >](to_index)
                .and_then(|state| $from.[< connect_port_ $from_port_name _i >](from_index, state))
        }
    }};
}

#[macro_export]
/// Look up one entry of a port array, returning a
/// [SimError](axis_engine::types::SimError) for a bad index.
macro_rules! port_index {
    ($self:ident . $ports:ident [ $index:expr ]) => {
        match $self.$ports.get($index) {
            Some(port) => Ok(port),
            None => axis_engine::sim_error!(format!(
                "{}: {}[{}] out of range (0..{})",
                $self.entity,
                stringify!($ports),
                $index,
                $self.$ports.len()
            )),
        }
    };
}
