macro_rules! async_mode_enabled {
    ($($item:item)*) => {
        $(
            #[cfg(feature = "async_mode")]
            $item
        )*
    };
}
