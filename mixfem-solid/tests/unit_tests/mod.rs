mod config;
mod kinematics;
