mod activity;
mod cluster;
mod controls;
mod details;
mod fps;
mod insights;
mod panels;

pub(super) use fps::FpsCounter;
