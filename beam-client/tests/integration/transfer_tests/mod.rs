mod test_send_file;
