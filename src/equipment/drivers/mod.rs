pub mod laser_dlnsec;
pub mod lcr_bk891;
